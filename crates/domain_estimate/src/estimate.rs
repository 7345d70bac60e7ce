//! Priced line-item estimates

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, EstimateId, Money, RandomSource, Rate};
use crate::damage::{DamageAssessment, RepairType};
use crate::error::EstimateError;
use crate::pricing::{MockPricingService, PricingProvider};
use crate::vehicle::Vehicle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineItemType {
    Part,
    Labor,
    Paint,
    Supplies,
}

/// Output layout an estimate is rendered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateFormat {
    CccOne,
    Mitchell,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub item_type: LineItemType,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Money,
    /// `quantity * unit_price`, rounded to the cent
    pub total: Money,
}

impl LineItem {
    pub fn new(item_type: LineItemType, description: impl Into<String>, quantity: Decimal, unit_price: Money) -> Self {
        Self {
            item_type,
            description: description.into(),
            quantity,
            unit_price,
            total: unit_price.multiply(quantity).round_to_currency(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Estimate {
    pub id: EstimateId,
    pub line_items: Vec<LineItem>,
    pub labor_rate: Money,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
    pub format: EstimateFormat,
    pub generated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Estimate {
    pub fn items_of(&self, item_type: LineItemType) -> impl Iterator<Item = &LineItem> {
        self.line_items.iter().filter(move |item| item.item_type == item_type)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Rates and flat charges used by the generator
#[derive(Debug, Clone)]
pub struct EstimateConfig {
    pub tax_rate: Rate,
    pub supplies_rate: Rate,
    pub paint_per_panel: Money,
    pub blend_per_panel: Money,
    pub validity_days: i64,
}

impl Default for EstimateConfig {
    fn default() -> Self {
        Self {
            tax_rate: Rate::from_percentage(dec!(8)),
            supplies_rate: Rate::from_percentage(dec!(3)),
            paint_per_panel: Money::usd(dec!(250)),
            blend_per_panel: Money::usd(dec!(150)),
            validity_days: 30,
        }
    }
}

/// Builds priced estimates from damage assessments
#[derive(Debug, Clone)]
pub struct EstimateGenerator<P = MockPricingService> {
    pricing: P,
    config: EstimateConfig,
}

impl EstimateGenerator<MockPricingService> {
    /// Generator backed by the mock pricing table and default rates
    pub fn with_mock_pricing() -> Self {
        Self::new(MockPricingService::default(), EstimateConfig::default())
    }
}

impl Default for EstimateGenerator<MockPricingService> {
    fn default() -> Self {
        Self::with_mock_pricing()
    }
}

impl<P: PricingProvider> EstimateGenerator<P> {
    pub fn new(pricing: P, config: EstimateConfig) -> Self {
        Self { pricing, config }
    }

    pub fn config(&self) -> &EstimateConfig {
        &self.config
    }

    /// Generates an estimate
    ///
    /// # Arguments
    ///
    /// * `assessment` - Damage to price
    /// * `vehicle` - Vehicle the parts are for; its age drives part prices
    /// * `format` - Layout recorded on the estimate
    /// * `rng` - Drives the labor rate and labor hours
    /// * `now` - Generation timestamp
    ///
    /// # Returns
    ///
    /// Part and labor lines for every affected part, followed by one paint
    /// line and one shop supplies line.
    pub fn generate(
        &self,
        assessment: &DamageAssessment,
        vehicle: &Vehicle,
        format: EstimateFormat,
        rng: &mut dyn RandomSource,
        now: DateTime<Utc>,
    ) -> Result<Estimate, EstimateError> {
        if assessment.detected_damages.is_empty() {
            return Err(EstimateError::NoDamageDetected);
        }

        let as_of = now.date_naive();
        let labor_rate = self.pricing.labor_rate(rng);
        let mut line_items = Vec::new();

        for damage in &assessment.detected_damages {
            for part in &damage.affected_parts {
                let price = self.pricing.part_price(part, vehicle, as_of);
                line_items.push(LineItem::new(LineItemType::Part, part.clone(), Decimal::ONE, price));

                let hours = match damage.repair_type {
                    RepairType::Replace => rng.decimal_between(dec!(2.5), dec!(4.5), 1),
                    RepairType::Repair => rng.decimal_between(dec!(1.0), dec!(2.5), 1),
                };
                line_items.push(LineItem::new(
                    LineItemType::Labor,
                    format!("{} - {}", part, damage.repair_type.as_str()),
                    hours,
                    labor_rate,
                ));
            }
        }

        let panels = assessment.distinct_areas().len() as u32;
        if panels > 0 {
            let blend = (panels as f64 * 0.5).ceil() as u32;
            let paint = self.config.paint_per_panel.multiply(Decimal::from(panels))
                + self.config.blend_per_panel.multiply(Decimal::from(blend));
            line_items.push(LineItem::new(
                LineItemType::Paint,
                format!("Refinish {} panel(s), blend {} adjacent", panels, blend),
                Decimal::ONE,
                paint,
            ));
        }

        let running = Money::sum(line_items.iter().map(|item| &item.total), Currency::USD)?;
        let supplies = self.config.supplies_rate.apply(&running).round_to_currency();
        line_items.push(LineItem::new(
            LineItemType::Supplies,
            format!("Shop supplies ({})", self.config.supplies_rate),
            Decimal::ONE,
            supplies,
        ));

        let subtotal = Money::sum(line_items.iter().map(|item| &item.total), Currency::USD)?;
        let tax = self.config.tax_rate.apply(&subtotal).round_to_currency();
        let total = subtotal.checked_add(&tax)?;

        let estimate = Estimate {
            id: EstimateId::new_v7(),
            line_items,
            labor_rate,
            subtotal,
            tax,
            total,
            format,
            generated_at: now,
            expires_at: now + Duration::days(self.config.validity_days),
        };

        tracing::debug!(
            estimate_id = %estimate.id,
            lines = estimate.line_items.len(),
            total = %estimate.total,
            "Estimate generated"
        );

        Ok(estimate)
    }
}
