//! Basic / OEM / premium estimate tiers
//!
//! A lighter cost model than the line-item generator: per-area base figures
//! scaled by severity, then a multiplier per cost component for each tier.
//! Tier totals are rounded to the nearest $10.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::{Money, Rate};
use crate::damage::{DamageArea, DamageAssessment};

const SUPPLIES_PER_DAMAGE: Decimal = dec!(45);
const TIER_TAX_PERCENT: Decimal = dec!(8);
const TOTAL_INCREMENT: Decimal = dec!(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateTier {
    Basic,
    Oem,
    Premium,
}

impl EstimateTier {
    pub const ALL: [EstimateTier; 3] = [EstimateTier::Basic, EstimateTier::Oem, EstimateTier::Premium];

    pub fn multipliers(&self) -> TierMultipliers {
        match self {
            EstimateTier::Basic => TierMultipliers {
                parts: dec!(0.65),
                labor: dec!(0.9),
                paint: dec!(0.85),
                supplies: dec!(1.0),
            },
            EstimateTier::Oem => TierMultipliers {
                parts: dec!(1.0),
                labor: dec!(1.0),
                paint: dec!(1.0),
                supplies: dec!(1.0),
            },
            EstimateTier::Premium => TierMultipliers {
                parts: dec!(1.0),
                labor: dec!(1.15),
                paint: dec!(1.3),
                supplies: dec!(1.1),
            },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EstimateTier::Basic => "Basic",
            EstimateTier::Oem => "OEM",
            EstimateTier::Premium => "Premium",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            EstimateTier::Basic => "Aftermarket parts with standard labor and refinish",
            EstimateTier::Oem => "Original equipment parts with factory-spec repair",
            EstimateTier::Premium => "OEM parts with master technicians and premium refinish",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierMultipliers {
    pub parts: Decimal,
    pub labor: Decimal,
    pub paint: Decimal,
    pub supplies: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateOption {
    pub tier: EstimateTier,
    pub label: String,
    pub description: String,
    pub parts: Money,
    pub labor: Money,
    pub paint: Money,
    pub supplies: Money,
    pub subtotal: Money,
    pub tax: Money,
    /// Rounded to the nearest $10
    pub total: Money,
}

/// Base (parts, labor, paint) for an area before severity scaling
fn base_components(area: DamageArea) -> (Decimal, Decimal, Decimal) {
    use DamageArea::*;
    match area {
        FrontBumper => (dec!(650), dec!(280), dec!(320)),
        RearBumper => (dec!(600), dec!(260), dec!(300)),
        Hood => (dec!(900), dec!(240), dec!(380)),
        Trunk => (dec!(850), dec!(260), dec!(350)),
        Roof => (dec!(1500), dec!(600), dec!(500)),
        Windshield => (dec!(450), dec!(150), dec!(0)),
        RearWindow => (dec!(380), dec!(140), dec!(0)),
        DriverFrontDoor | DriverRearDoor | PassengerFrontDoor | PassengerRearDoor => {
            (dec!(950), dec!(320), dec!(360))
        }
        DriverFender | PassengerFender => (dec!(500), dec!(220), dec!(300)),
        DriverQuarterPanel | PassengerQuarterPanel => (dec!(1200), dec!(520), dec!(420)),
        Headlights => (dec!(420), dec!(90), dec!(0)),
        Taillights => (dec!(260), dec!(70), dec!(0)),
    }
}

/// Produces the basic, OEM and premium options for an assessment, in that order
pub fn generate_estimate_options(assessment: &DamageAssessment) -> Vec<EstimateOption> {
    let mut parts = Decimal::ZERO;
    let mut labor = Decimal::ZERO;
    let mut paint = Decimal::ZERO;
    let mut supplies = Decimal::ZERO;

    for damage in &assessment.detected_damages {
        let (p, l, pt) = base_components(damage.area);
        let severity = damage.severity.multiplier();
        parts += p * severity;
        labor += l * severity;
        paint += pt * severity;
        supplies += SUPPLIES_PER_DAMAGE;
    }

    let tax_rate = Rate::from_percentage(TIER_TAX_PERCENT);

    EstimateTier::ALL
        .iter()
        .map(|tier| {
            let m = tier.multipliers();
            let parts = Money::usd(parts * m.parts);
            let labor = Money::usd(labor * m.labor);
            let paint = Money::usd(paint * m.paint);
            let supplies = Money::usd(supplies * m.supplies);
            let subtotal = parts + labor + paint + supplies;
            let tax = tax_rate.apply(&subtotal);
            let total = (subtotal + tax).round_to_increment(TOTAL_INCREMENT);

            EstimateOption {
                tier: *tier,
                label: tier.label().to_string(),
                description: tier.description().to_string(),
                parts,
                labor,
                paint,
                supplies,
                subtotal,
                tax,
                total,
            }
        })
        .collect()
}

/// Percentage saved by choosing `basic` over `oem`, rounded to a whole percent
///
/// Returns 0 when `oem` is zero.
pub fn calculate_savings(basic: Money, oem: Money) -> i64 {
    if oem.is_zero() {
        return 0;
    }
    ((oem.amount() - basic.amount()) / oem.amount() * dec!(100))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(0)
}
