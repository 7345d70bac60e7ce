//! Damage assessment and the mock photo analyzer
//!
//! The analyzer stands in for an image model: each photo angle maps to the
//! body areas visible from it, and severity, confidence and repair type are
//! drawn from the injected [`RandomSource`].

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::RandomSource;
use crate::photo::{Photo, PhotoAngle};

/// Body regions the analyzer can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageArea {
    FrontBumper,
    RearBumper,
    Hood,
    Trunk,
    Roof,
    Windshield,
    RearWindow,
    DriverFrontDoor,
    DriverRearDoor,
    PassengerFrontDoor,
    PassengerRearDoor,
    DriverFender,
    PassengerFender,
    DriverQuarterPanel,
    PassengerQuarterPanel,
    Headlights,
    Taillights,
}

impl DamageArea {
    pub const ALL: [DamageArea; 17] = [
        DamageArea::FrontBumper,
        DamageArea::RearBumper,
        DamageArea::Hood,
        DamageArea::Trunk,
        DamageArea::Roof,
        DamageArea::Windshield,
        DamageArea::RearWindow,
        DamageArea::DriverFrontDoor,
        DamageArea::DriverRearDoor,
        DamageArea::PassengerFrontDoor,
        DamageArea::PassengerRearDoor,
        DamageArea::DriverFender,
        DamageArea::PassengerFender,
        DamageArea::DriverQuarterPanel,
        DamageArea::PassengerQuarterPanel,
        DamageArea::Headlights,
        DamageArea::Taillights,
    ];

    /// Lower-case human label, e.g. "front bumper"
    pub fn label(&self) -> &'static str {
        match self {
            DamageArea::FrontBumper => "front bumper",
            DamageArea::RearBumper => "rear bumper",
            DamageArea::Hood => "hood",
            DamageArea::Trunk => "trunk",
            DamageArea::Roof => "roof",
            DamageArea::Windshield => "windshield",
            DamageArea::RearWindow => "rear window",
            DamageArea::DriverFrontDoor => "driver front door",
            DamageArea::DriverRearDoor => "driver rear door",
            DamageArea::PassengerFrontDoor => "passenger front door",
            DamageArea::PassengerRearDoor => "passenger rear door",
            DamageArea::DriverFender => "driver fender",
            DamageArea::PassengerFender => "passenger fender",
            DamageArea::DriverQuarterPanel => "driver quarter panel",
            DamageArea::PassengerQuarterPanel => "passenger quarter panel",
            DamageArea::Headlights => "headlights",
            DamageArea::Taillights => "taillights",
        }
    }

    /// Parts that can be affected, most visible first
    pub fn parts(&self) -> &'static [&'static str] {
        match self {
            DamageArea::FrontBumper => &["Front Bumper Cover", "Front Bumper Reinforcement", "Front Bumper Absorber"],
            DamageArea::RearBumper => &["Rear Bumper Cover", "Rear Bumper Reinforcement", "Rear Bumper Absorber"],
            DamageArea::Hood => &["Hood Panel", "Hood Latch Bracket", "Hood Emblem"],
            DamageArea::Trunk => &["Trunk Lid", "Trunk Lid Molding", "Trunk Emblem"],
            DamageArea::Roof => &["Roof Panel", "Roof Molding"],
            DamageArea::Windshield => &["Windshield Glass", "Windshield Molding"],
            DamageArea::RearWindow => &["Rear Window Glass", "Rear Window Molding"],
            DamageArea::DriverFrontDoor => &["Driver Front Door Shell", "Driver Front Door Molding", "Driver Front Window Regulator"],
            DamageArea::DriverRearDoor => &["Driver Rear Door Shell", "Driver Rear Door Molding", "Driver Rear Window Regulator"],
            DamageArea::PassengerFrontDoor => &["Passenger Front Door Shell", "Passenger Front Door Molding", "Passenger Front Window Regulator"],
            DamageArea::PassengerRearDoor => &["Passenger Rear Door Shell", "Passenger Rear Door Molding", "Passenger Rear Window Regulator"],
            DamageArea::DriverFender => &["Driver Fender", "Driver Fender Molding", "Driver Fender Bracket"],
            DamageArea::PassengerFender => &["Passenger Fender", "Passenger Fender Molding", "Passenger Fender Bracket"],
            DamageArea::DriverQuarterPanel => &["Driver Quarter Panel", "Driver Quarter Panel Molding"],
            DamageArea::PassengerQuarterPanel => &["Passenger Quarter Panel", "Passenger Quarter Panel Molding"],
            DamageArea::Headlights => &["Headlight Assembly", "Headlight Bracket"],
            DamageArea::Taillights => &["Taillight Assembly"],
        }
    }

    /// Hint emitted when this area is severely damaged
    pub fn hidden_damage_hint(&self) -> &'static str {
        match self {
            DamageArea::FrontBumper => "Possible radiator support or cooling system damage behind front bumper",
            DamageArea::RearBumper => "Possible rear body panel or exhaust damage behind rear bumper",
            DamageArea::Hood | DamageArea::Headlights => "Possible damage to engine bay components",
            DamageArea::Trunk | DamageArea::Taillights => "Possible trunk floor or rear body panel damage",
            DamageArea::Roof => "Possible roof bow or headliner damage",
            DamageArea::Windshield | DamageArea::RearWindow => "Possible pinch weld or glass channel damage",
            DamageArea::DriverFrontDoor
            | DamageArea::DriverRearDoor
            | DamageArea::PassengerFrontDoor
            | DamageArea::PassengerRearDoor => "Possible door intrusion beam or hinge damage",
            DamageArea::DriverFender | DamageArea::PassengerFender => "Possible wheel well or suspension damage",
            DamageArea::DriverQuarterPanel | DamageArea::PassengerQuarterPanel => {
                "Possible inner quarter or wheelhouse damage"
            }
        }
    }
}

/// Areas visible from a photo angle, primary area first
fn areas_for_angle(angle: PhotoAngle) -> &'static [DamageArea] {
    use DamageArea::*;
    match angle {
        PhotoAngle::Front => &[FrontBumper, Hood, Headlights],
        PhotoAngle::Rear => &[RearBumper, Trunk, Taillights],
        PhotoAngle::DriverSide => &[DriverFrontDoor, DriverRearDoor, DriverFender],
        PhotoAngle::PassengerSide => &[PassengerFrontDoor, PassengerRearDoor, PassengerFender],
        PhotoAngle::FrontDriverCorner => &[FrontBumper, DriverFender, Headlights],
        PhotoAngle::FrontPassengerCorner => &[FrontBumper, PassengerFender, Headlights],
        PhotoAngle::RearDriverCorner => &[RearBumper, DriverQuarterPanel, Taillights],
        PhotoAngle::RearPassengerCorner => &[RearBumper, PassengerQuarterPanel, Taillights],
        PhotoAngle::Closeup => &DamageArea::ALL,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Minor,
    Moderate,
    Severe,
}

impl Severity {
    /// Cost multiplier applied to base repair figures
    pub fn multiplier(&self) -> Decimal {
        match self {
            Severity::Minor => dec!(0.6),
            Severity::Moderate => dec!(1.0),
            Severity::Severe => dec!(1.5),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Minor => "Minor",
            Severity::Moderate => "Moderate",
            Severity::Severe => "Severe",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairType {
    Repair,
    Replace,
}

impl RepairType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepairType::Repair => "repair",
            RepairType::Replace => "replace",
        }
    }
}

/// One damaged area found in the photos
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedDamage {
    pub area: DamageArea,
    pub severity: Severity,
    /// Detection confidence in `[0, 1]`
    pub confidence: f64,
    pub affected_parts: Vec<String>,
    pub repair_type: RepairType,
}

/// Result of analysing a claim's photos
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageAssessment {
    pub detected_damages: Vec<DetectedDamage>,
    /// Overall confidence in `[0, 1]`
    pub confidence: f64,
    pub potential_hidden_damage: Vec<String>,
    pub processing_time_ms: u64,
}

impl DamageAssessment {
    pub fn severe_count(&self) -> usize {
        self.detected_damages
            .iter()
            .filter(|d| d.severity == Severity::Severe)
            .count()
    }

    /// Distinct damaged areas in detection order
    pub fn distinct_areas(&self) -> Vec<DamageArea> {
        let mut seen = HashSet::new();
        self.detected_damages
            .iter()
            .filter(|d| seen.insert(d.area))
            .map(|d| d.area)
            .collect()
    }

    /// Mean per-damage confidence; zero with no damages
    pub fn average_damage_confidence(&self) -> f64 {
        if self.detected_damages.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.detected_damages.iter().map(|d| d.confidence).sum();
        sum / self.detected_damages.len() as f64
    }
}

const SECONDARY_AREA_CHANCE: f64 = 0.35;
const MODERATE_REPLACE_CHANCE: f64 = 0.4;
const FRAME_CHECK_DAMAGE_COUNT: usize = 3;
const FRAME_CHECK_HINT: &str = "Multiple impact areas detected; frame and unibody measurement recommended";

fn roll_damage(area: DamageArea, rng: &mut dyn RandomSource) -> DetectedDamage {
    let roll = rng.next_f64();
    let severity = if roll < 0.45 {
        Severity::Minor
    } else if roll < 0.85 {
        Severity::Moderate
    } else {
        Severity::Severe
    };

    let confidence = (rng.range_f64(0.62, 0.97) * 100.0).round() / 100.0;

    let repair_type = match severity {
        Severity::Severe => RepairType::Replace,
        Severity::Moderate if rng.chance(MODERATE_REPLACE_CHANCE) => RepairType::Replace,
        _ => RepairType::Repair,
    };

    let parts = area.parts();
    let part_count = match severity {
        Severity::Minor => 1,
        Severity::Moderate => 2,
        Severity::Severe => parts.len(),
    }
    .min(parts.len());

    DetectedDamage {
        area,
        severity,
        confidence,
        affected_parts: parts[..part_count].iter().map(|p| p.to_string()).collect(),
        repair_type,
    }
}

/// Runs the mock damage detector over a set of photos
///
/// Every photo contributes its primary area and, with a 35% chance, one
/// secondary area visible from the same angle. An area is reported at most
/// once. Untagged photos are close-ups and hit a random area.
pub fn analyze_photos(photos: &[Photo], rng: &mut dyn RandomSource) -> DamageAssessment {
    let mut seen = HashSet::new();
    let mut damages = Vec::new();

    for photo in photos {
        let angle = photo.effective_angle();
        let candidates = areas_for_angle(angle);

        let primary = if angle == PhotoAngle::Closeup {
            candidates[rng.pick_index(candidates.len())]
        } else {
            candidates[0]
        };
        let mut hits = vec![primary];

        if candidates.len() > 1 && rng.chance(SECONDARY_AREA_CHANCE) {
            let secondary = candidates[1 + rng.pick_index(candidates.len() - 1)];
            hits.push(secondary);
        }

        for area in hits {
            if seen.insert(area) {
                damages.push(roll_damage(area, rng));
            }
        }
    }

    let mut hints: Vec<String> = Vec::new();
    for damage in damages.iter().filter(|d| d.severity == Severity::Severe) {
        let hint = damage.area.hidden_damage_hint();
        if !hints.iter().any(|h| h == hint) {
            hints.push(hint.to_string());
        }
    }
    if damages.len() >= FRAME_CHECK_DAMAGE_COUNT {
        hints.push(FRAME_CHECK_HINT.to_string());
    }

    let confidence = if damages.is_empty() {
        0.0
    } else {
        let mean = damages.iter().map(|d| d.confidence).sum::<f64>() / damages.len() as f64;
        (mean * 100.0).round() / 100.0
    };

    DamageAssessment {
        detected_damages: damages,
        confidence,
        potential_hidden_damage: hints,
        processing_time_ms: rng.range_i64(1500, 3500) as u64,
    }
}

/// Async front for the mock detector with simulated model latency
#[derive(Debug, Clone, Default)]
pub struct DamageAnalyzer {
    latency: Duration,
}

impl DamageAnalyzer {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    /// Waits out the configured latency
    ///
    /// Split from [`analyze_photos`] so callers can hold their random source
    /// only for the computation itself.
    pub async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    pub async fn analyze(&self, photos: &[Photo], rng: &mut dyn RandomSource) -> DamageAssessment {
        self.simulate_latency().await;
        let assessment = analyze_photos(photos, rng);
        tracing::debug!(
            photos = photos.len(),
            damages = assessment.detected_damages.len(),
            confidence = assessment.confidence,
            "Damage analysis complete"
        );
        assessment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{SeededRandom, SequenceRandom};

    fn photo(angle: PhotoAngle) -> Photo {
        Photo::new(format!("file:///{:?}.jpg", angle), Some(angle))
    }

    #[test]
    fn test_primary_areas_always_detected() {
        let photos = vec![
            photo(PhotoAngle::Front),
            photo(PhotoAngle::Rear),
            photo(PhotoAngle::DriverSide),
            photo(PhotoAngle::PassengerSide),
        ];
        // 0.9 never passes the 35% secondary roll
        let mut rng = SequenceRandom::constant(0.9);
        let assessment = analyze_photos(&photos, &mut rng);

        let areas = assessment.distinct_areas();
        assert_eq!(
            areas,
            vec![
                DamageArea::FrontBumper,
                DamageArea::RearBumper,
                DamageArea::DriverFrontDoor,
                DamageArea::PassengerFrontDoor,
            ]
        );
    }

    #[test]
    fn test_areas_are_not_repeated() {
        let photos = vec![photo(PhotoAngle::Front), photo(PhotoAngle::FrontDriverCorner)];
        let mut rng = SequenceRandom::constant(0.9);
        let assessment = analyze_photos(&photos, &mut rng);

        assert_eq!(assessment.detected_damages.len(), 1);
        assert_eq!(assessment.detected_damages[0].area, DamageArea::FrontBumper);
    }

    #[test]
    fn test_severe_damage_is_replaced_with_all_parts() {
        let mut rng = SequenceRandom::constant(0.9);
        let damage = roll_damage(DamageArea::FrontBumper, &mut rng);

        assert_eq!(damage.severity, Severity::Severe);
        assert_eq!(damage.repair_type, RepairType::Replace);
        assert_eq!(damage.affected_parts.len(), 3);
    }

    #[test]
    fn test_minor_damage_is_repaired() {
        let mut rng = SequenceRandom::constant(0.1);
        let damage = roll_damage(DamageArea::Hood, &mut rng);

        assert_eq!(damage.severity, Severity::Minor);
        assert_eq!(damage.repair_type, RepairType::Repair);
        assert_eq!(damage.affected_parts, vec!["Hood Panel".to_string()]);
    }

    #[test]
    fn test_frame_hint_with_three_damages() {
        let photos = vec![
            photo(PhotoAngle::Front),
            photo(PhotoAngle::Rear),
            photo(PhotoAngle::DriverSide),
        ];
        let mut rng = SequenceRandom::constant(0.9);
        let assessment = analyze_photos(&photos, &mut rng);

        assert!(assessment
            .potential_hidden_damage
            .iter()
            .any(|h| h == FRAME_CHECK_HINT));
    }

    #[test]
    fn test_empty_photos_give_empty_assessment() {
        let mut rng = SeededRandom::from_seed(1);
        let assessment = analyze_photos(&[], &mut rng);
        assert!(assessment.detected_damages.is_empty());
        assert_eq!(assessment.confidence, 0.0);
        assert!((1500..=3500).contains(&assessment.processing_time_ms));
    }

    #[test]
    fn test_confidence_bounds() {
        let photos: Vec<Photo> = PhotoAngle::ALL.iter().map(|a| photo(*a)).collect();
        let mut rng = SeededRandom::from_seed(99);
        let assessment = analyze_photos(&photos, &mut rng);

        for damage in &assessment.detected_damages {
            assert!(damage.confidence >= 0.62 && damage.confidence <= 0.97);
        }
    }

    #[tokio::test]
    async fn test_analyzer_service() {
        let analyzer = DamageAnalyzer::new(Duration::from_millis(1));
        let mut rng = SeededRandom::from_seed(5);
        let assessment = analyzer.analyze(&[photo(PhotoAngle::Rear)], &mut rng).await;
        assert_eq!(assessment.detected_damages[0].area, DamageArea::RearBumper);
    }
}
