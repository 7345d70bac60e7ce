//! Part and labor pricing
//!
//! [`PricingProvider`] is the seam for a real parts catalogue. The mock
//! implementation resolves a part by partial name match against a fixed
//! table, adjusts for vehicle age and applies a retail markup.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{Money, RandomSource};
use crate::vehicle::Vehicle;

/// Source of part prices and labor rates
pub trait PricingProvider: Send + Sync {
    /// Retail price for a named part on the given vehicle
    fn part_price(&self, part_name: &str, vehicle: &Vehicle, as_of: NaiveDate) -> Money;

    /// Hourly labor rate for the shop's region
    fn labor_rate(&self, rng: &mut dyn RandomSource) -> Money;
}

/// Base prices keyed by name fragment; the first matching fragment wins
const PART_PRICES: &[(&str, Decimal)] = &[
    ("molding", dec!(65)),
    ("emblem", dec!(40)),
    ("bracket", dec!(45)),
    ("absorber", dec!(95)),
    ("window regulator", dec!(165)),
    ("reinforcement", dec!(240)),
    ("bumper cover", dec!(385)),
    ("bumper", dec!(420)),
    ("hood", dec!(620)),
    ("trunk lid", dec!(680)),
    ("roof", dec!(1150)),
    ("windshield", dec!(410)),
    ("rear window", dec!(330)),
    ("door shell", dec!(890)),
    ("door", dec!(780)),
    ("fender", dec!(360)),
    ("quarter panel", dec!(1050)),
    ("headlight", dec!(310)),
    ("headlamp", dec!(310)),
    ("taillight", dec!(215)),
    ("tail lamp", dec!(215)),
    ("mirror", dec!(185)),
];

const DEFAULT_PART_PRICE: Decimal = dec!(150);

/// Mock pricing service
#[derive(Debug, Clone)]
pub struct MockPricingService {
    /// Regional base labor rate per hour
    pub base_labor_rate: Decimal,
    /// Maximum deviation from the base rate in either direction
    pub labor_rate_variance: Decimal,
    /// Price increase per year of vehicle age
    pub age_factor: Decimal,
    /// Retail markup over dealer cost
    pub markup: Decimal,
}

impl Default for MockPricingService {
    fn default() -> Self {
        Self {
            base_labor_rate: dec!(85),
            labor_rate_variance: dec!(5),
            age_factor: dec!(0.02),
            markup: dec!(1.2),
        }
    }
}

impl MockPricingService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unadjusted table price for a part name
    pub fn base_part_price(part_name: &str) -> Decimal {
        let name = part_name.to_lowercase();
        PART_PRICES
            .iter()
            .find(|(fragment, _)| name.contains(fragment))
            .map(|(_, price)| *price)
            .unwrap_or(DEFAULT_PART_PRICE)
    }
}

impl PricingProvider for MockPricingService {
    fn part_price(&self, part_name: &str, vehicle: &Vehicle, as_of: NaiveDate) -> Money {
        let age = Decimal::from(vehicle.age(as_of));
        let price = Self::base_part_price(part_name)
            * (Decimal::ONE + age * self.age_factor)
            * self.markup;
        Money::usd(price).round_to_currency()
    }

    fn labor_rate(&self, rng: &mut dyn RandomSource) -> Money {
        let rate = rng.decimal_between(
            self.base_labor_rate - self.labor_rate_variance,
            self.base_labor_rate + self.labor_rate_variance,
            2,
        );
        Money::usd(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::SequenceRandom;

    #[test]
    fn test_partial_match_order() {
        assert_eq!(MockPricingService::base_part_price("Front Bumper Cover"), dec!(385));
        assert_eq!(MockPricingService::base_part_price("Front Bumper Reinforcement"), dec!(240));
        assert_eq!(MockPricingService::base_part_price("Driver Front Door Molding"), dec!(65));
        assert_eq!(MockPricingService::base_part_price("Driver Front Door Shell"), dec!(890));
        assert_eq!(MockPricingService::base_part_price("Side Mirror Glass"), dec!(185));
        assert_eq!(MockPricingService::base_part_price("Wheel Hub"), dec!(150));
    }

    #[test]
    fn test_age_adjustment_and_markup() {
        let pricing = MockPricingService::new();
        let vehicle = Vehicle::new(2014, "Ford", "Focus");
        let as_of = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();

        // 385 * 1.2 (10 years) * 1.2 markup
        let price = pricing.part_price("Rear Bumper Cover", &vehicle, as_of);
        assert_eq!(price.amount(), dec!(554.40));
    }

    #[test]
    fn test_labor_rate_range() {
        let pricing = MockPricingService::new();
        assert_eq!(pricing.labor_rate(&mut SequenceRandom::constant(0.0)).amount(), dec!(80));
        assert_eq!(pricing.labor_rate(&mut SequenceRandom::constant(0.5)).amount(), dec!(85));
    }
}
