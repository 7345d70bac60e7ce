//! Estimating Domain
//!
//! Turns a vehicle and a set of photos into cost figures:
//!
//! ```text
//! Photos -> DamageAssessment -> PreEstimate (instant range)
//!                            -> Estimate (priced line items) -> CCC ONE / Mitchell text
//!                            -> EstimateOption x3 (basic / OEM / premium)
//! ```
//!
//! Damage detection and part pricing are mock services driven by a
//! [`core_kernel::RandomSource`]; everything downstream of them is
//! deterministic arithmetic.

pub mod vehicle;
pub mod photo;
pub mod damage;
pub mod pre_estimate;
pub mod pricing;
pub mod estimate;
pub mod format;
pub mod options;
pub mod photo_quality;
pub mod error;

pub use vehicle::{Vehicle, VehicleUpdate};
pub use photo::{Photo, PhotoAngle};
pub use damage::{
    analyze_photos, DamageAnalyzer, DamageArea, DamageAssessment, DetectedDamage,
    RepairType, Severity,
};
pub use pre_estimate::{generate_pre_estimate, CostRange, PreEstimate, RepairDays};
pub use pricing::{MockPricingService, PricingProvider};
pub use estimate::{Estimate, EstimateConfig, EstimateFormat, EstimateGenerator, LineItem, LineItemType};
pub use format::{format_ccc_one, format_estimate, format_mitchell};
pub use options::{calculate_savings, generate_estimate_options, EstimateOption, EstimateTier, TierMultipliers};
pub use photo_quality::{assess_photo_quality, PhotoMetadata, PhotoQualityReport, QualityIssue};
pub use error::EstimateError;
