//! Instant pre-estimate
//!
//! A rough cost range shown as soon as damage detection finishes, before a
//! shop prices the job. Base costs per area are scaled by severity, widened
//! by a confidence-dependent variance band, summed, then loaded once for
//! labor and for paint and supplies.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::Money;
use crate::damage::{DamageArea, DamageAssessment, RepairType};

const LABOR_MULTIPLIER: Decimal = dec!(1.3);
const PAINT_SUPPLIES_MULTIPLIER: Decimal = dec!(1.2);
const ROUNDING_INCREMENT: Decimal = dec!(50);
const LOW_CONFIDENCE_THRESHOLD: f64 = 0.7;
const LOW_CONFIDENCE_VARIANCE: Decimal = dec!(0.15);
const STANDARD_VARIANCE: Decimal = dec!(0.10);

pub const DISCLAIMER: &str = "This is a preliminary estimate based on automated photo analysis. \
    Final repair costs may vary after an in-person inspection by a certified body shop.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostRange {
    pub low: Money,
    pub typical: Money,
    pub high: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepairDays {
    pub min: u32,
    pub max: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreEstimate {
    pub range: CostRange,
    pub repair_days: RepairDays,
    /// 0-100
    pub confidence: u32,
    pub damages: Vec<String>,
    pub disclaimer: String,
}

/// Base (repair, replace) cost for an area
fn base_cost(area: DamageArea) -> (Decimal, Decimal) {
    use DamageArea::*;
    match area {
        FrontBumper => (dec!(450), dec!(1200)),
        RearBumper => (dec!(450), dec!(1100)),
        Hood => (dec!(500), dec!(1400)),
        Trunk => (dec!(450), dec!(1300)),
        Roof => (dec!(800), dec!(2500)),
        Windshield => (dec!(350), dec!(900)),
        RearWindow => (dec!(300), dec!(700)),
        DriverFrontDoor | PassengerFrontDoor => (dec!(550), dec!(1600)),
        DriverRearDoor | PassengerRearDoor => (dec!(550), dec!(1500)),
        DriverFender | PassengerFender => (dec!(400), dec!(1000)),
        DriverQuarterPanel | PassengerQuarterPanel => (dec!(700), dec!(2200)),
        Headlights => (dec!(250), dec!(650)),
        Taillights => (dec!(200), dec!(450)),
    }
}

/// Builds the pre-estimate for an assessment
///
/// # Arguments
///
/// * `assessment` - Output of the damage analyzer
///
/// # Returns
///
/// A cost range whose bounds are multiples of $50 with `low <= typical <= high`
pub fn generate_pre_estimate(assessment: &DamageAssessment) -> PreEstimate {
    let mut low = Decimal::ZERO;
    let mut typical = Decimal::ZERO;
    let mut high = Decimal::ZERO;

    for damage in &assessment.detected_damages {
        let (repair, replace) = base_cost(damage.area);
        let base = match damage.repair_type {
            RepairType::Repair => repair,
            RepairType::Replace => replace,
        };
        let cost = base * damage.severity.multiplier();
        let variance = if damage.confidence < LOW_CONFIDENCE_THRESHOLD {
            LOW_CONFIDENCE_VARIANCE
        } else {
            STANDARD_VARIANCE
        };

        typical += cost;
        low += cost * (Decimal::ONE - variance);
        high += cost * (Decimal::ONE + variance);
    }

    let load = |total: Decimal| {
        Money::usd(total * LABOR_MULTIPLIER * PAINT_SUPPLIES_MULTIPLIER).round_to_increment(ROUNDING_INCREMENT)
    };

    let count = assessment.detected_damages.len() as f64;
    let repair_days = RepairDays {
        min: ((count * 0.5).ceil() as u32).max(2),
        max: (count * 1.5).ceil() as u32,
    };

    let confidence =
        (assessment.average_damage_confidence() * assessment.confidence * 100.0).round() as u32;

    let damages = assessment
        .detected_damages
        .iter()
        .map(|d| format!("{} damage to {} ({})", d.severity.label(), d.area.label(), d.repair_type.as_str()))
        .collect();

    PreEstimate {
        range: CostRange {
            low: load(low),
            typical: load(typical),
            high: load(high),
        },
        repair_days,
        confidence,
        damages,
        disclaimer: DISCLAIMER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::damage::{DetectedDamage, Severity};

    fn damage(area: DamageArea, severity: Severity, confidence: f64, repair_type: RepairType) -> DetectedDamage {
        DetectedDamage {
            area,
            severity,
            confidence,
            affected_parts: vec![],
            repair_type,
        }
    }

    fn assessment(damages: Vec<DetectedDamage>, confidence: f64) -> DamageAssessment {
        DamageAssessment {
            detected_damages: damages,
            confidence,
            potential_hidden_damage: vec![],
            processing_time_ms: 2000,
        }
    }

    #[test]
    fn test_single_moderate_replace() {
        let a = assessment(
            vec![damage(DamageArea::FrontBumper, Severity::Moderate, 0.9, RepairType::Replace)],
            0.9,
        );
        let pre = generate_pre_estimate(&a);

        // 1200 * 1.56 = 1872 -> 1850; 1080 * 1.56 = 1684.8 -> 1700; 1320 * 1.56 = 2059.2 -> 2050
        assert_eq!(pre.range.typical.amount(), dec!(1850));
        assert_eq!(pre.range.low.amount(), dec!(1700));
        assert_eq!(pre.range.high.amount(), dec!(2050));
        assert_eq!(pre.damages, vec!["Moderate damage to front bumper (replace)".to_string()]);
    }

    #[test]
    fn test_low_confidence_widens_band() {
        let a = assessment(
            vec![damage(DamageArea::Roof, Severity::Severe, 0.65, RepairType::Replace)],
            0.65,
        );
        let pre = generate_pre_estimate(&a);

        // 2500 * 1.5 = 3750; +/-15%; *1.56
        assert_eq!(pre.range.typical.amount(), dec!(5850));
        assert_eq!(pre.range.low.amount(), dec!(4950));
        assert_eq!(pre.range.high.amount(), dec!(6750));
    }

    #[test]
    fn test_repair_days() {
        let one = assessment(vec![damage(DamageArea::Hood, Severity::Minor, 0.8, RepairType::Repair)], 0.8);
        assert_eq!(generate_pre_estimate(&one).repair_days, RepairDays { min: 2, max: 2 });

        let five = assessment(
            DamageArea::ALL[..5]
                .iter()
                .map(|a| damage(*a, Severity::Minor, 0.8, RepairType::Repair))
                .collect(),
            0.8,
        );
        assert_eq!(generate_pre_estimate(&five).repair_days, RepairDays { min: 3, max: 8 });
    }

    #[test]
    fn test_confidence_percentage() {
        let a = assessment(
            vec![
                damage(DamageArea::Hood, Severity::Minor, 0.8, RepairType::Repair),
                damage(DamageArea::Trunk, Severity::Minor, 0.9, RepairType::Repair),
            ],
            0.85,
        );
        // 0.85 * 0.85 * 100 = 72.25
        assert_eq!(generate_pre_estimate(&a).confidence, 72);
    }

    #[test]
    fn test_empty_assessment() {
        let pre = generate_pre_estimate(&assessment(vec![], 0.0));
        assert!(pre.range.typical.is_zero());
        assert_eq!(pre.confidence, 0);
        assert_eq!(pre.disclaimer, DISCLAIMER);
    }
}
