//! Claims Domain
//!
//! This crate implements the collision claim lifecycle from draft through
//! damage analysis, adjuster review and the locked insurance record.
//!
//! # Claim Lifecycle
//!
//! ```text
//! Draft -> Analyzing -> PendingReview -> Approved / Rejected
//!                            |
//!                            v
//!                     SupplementNeeded -> Analyzing | PendingReview
//! ```

pub mod user;
pub mod claim;
pub mod insurance;
pub mod fraud;
pub mod timeline;
pub mod workflow;
pub mod store;
pub mod error;

pub use user::{User, UserRole};
pub use claim::{Claim, ClaimStatus, ReviewDecision};
pub use insurance::{validate_insurance_info, InsuranceInfo, InsuranceInfoStatus};
pub use fraud::{
    analyze_fraud, fraud_base_score, fraud_indicators, FraudAnalysis, FraudIndicator,
    FraudRecommendation, RiskLevel,
};
pub use timeline::{build_timeline, ClaimTimeline, TimelineEntry, TimelineStep, REVIEW_SLA_HOURS};
pub use workflow::{is_auto_approval_eligible, notifications_for_status, AUTO_APPROVAL_THRESHOLD};
pub use store::{ClaimStore, StoreConfig, CLAIMS_KEY};
pub use error::ClaimError;
