//! Test Data Builders
//!
//! Builders that let a test specify only the fields it cares about. Claims
//! are assembled through the same domain methods the store uses, so a built
//! claim is always in a reachable state.

use chrono::{DateTime, Duration, Utc};
use core_kernel::{Currency, EstimateId, Money};
use domain_claims::{Claim, InsuranceInfo, User};
use domain_estimate::{DamageAssessment, Estimate, EstimateFormat, Photo, VehicleUpdate};
use rust_decimal_macros::dec;

use crate::fixtures::{TemporalFixtures, UserFixtures};

/// Builder for claims at any point in the lifecycle
pub struct ClaimBuilder {
    creator: User,
    created_at: DateTime<Utc>,
    vehicle: Option<VehicleUpdate>,
    photos: Vec<Photo>,
    assessment: Option<DamageAssessment>,
    estimate: Option<Estimate>,
    insurance: Option<InsuranceInfo>,
    submitted: bool,
}

impl Default for ClaimBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimBuilder {
    /// A draft claim created by a body shop at [`TemporalFixtures::now`]
    pub fn new() -> Self {
        Self {
            creator: UserFixtures::body_shop(),
            created_at: TemporalFixtures::now(),
            vehicle: None,
            photos: Vec::new(),
            assessment: None,
            estimate: None,
            insurance: None,
            submitted: false,
        }
    }

    pub fn created_by(mut self, user: &User) -> Self {
        self.creator = user.clone();
        self
    }

    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    pub fn with_vehicle(mut self, vehicle: VehicleUpdate) -> Self {
        self.vehicle = Some(vehicle);
        self
    }

    pub fn with_photos(mut self, photos: Vec<Photo>) -> Self {
        self.photos = photos;
        self
    }

    /// Attaches an assessment; the built claim is pending review
    pub fn with_assessment(mut self, assessment: DamageAssessment) -> Self {
        self.assessment = Some(assessment);
        self
    }

    pub fn with_estimate(mut self, estimate: Estimate) -> Self {
        self.estimate = Some(estimate);
        self
    }

    pub fn with_insurance(mut self, info: InsuranceInfo) -> Self {
        self.insurance = Some(info);
        self
    }

    /// Submits the claim for review an hour after creation
    pub fn submitted(mut self) -> Self {
        self.submitted = true;
        self
    }

    pub fn build(self) -> Claim {
        let at = self.created_at;
        let mut claim = Claim::new(&self.creator, at);

        if let Some(vehicle) = self.vehicle {
            claim.update_vehicle(vehicle, at);
        }
        if !self.photos.is_empty() {
            claim.add_photos(self.photos, at);
        }
        if let Some(info) = self.insurance {
            claim
                .update_insurance_info(info, self.creator.id, at)
                .expect("a new claim is never locked");
        }
        if let Some(assessment) = self.assessment {
            claim.start_analysis(at).expect("draft claims can be analyzed");
            claim.set_damage_assessment(assessment, at);
        }
        if let Some(estimate) = self.estimate {
            claim.set_estimate(estimate, at);
        }
        if self.submitted {
            claim.submit(at + Duration::hours(1));
        }
        claim
    }
}

/// An estimate with a single line carrying the whole `total`
///
/// Enough for threshold checks; the line items do not reflect real pricing.
pub fn estimate_with_total(total: Money, now: DateTime<Utc>) -> Estimate {
    use domain_estimate::{LineItem, LineItemType};
    use rust_decimal::Decimal;

    Estimate {
        id: EstimateId::new(),
        line_items: vec![LineItem::new(LineItemType::Part, "Front Bumper Cover", Decimal::ONE, total)],
        labor_rate: Money::new(dec!(65), Currency::USD),
        subtotal: total,
        tax: Money::zero(Currency::USD),
        total,
        format: EstimateFormat::CccOne,
        generated_at: now,
        expires_at: now + Duration::days(30),
    }
}
