//! Claim aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ClaimId, UserId};
use domain_estimate::{
    generate_pre_estimate, DamageAssessment, Estimate, Photo, PreEstimate, Vehicle, VehicleUpdate,
};

use crate::error::ClaimError;
use crate::insurance::{validate_insurance_info, InsuranceInfo, InsuranceInfoStatus};
use crate::user::{User, UserRole};

/// Claim status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    /// Being filled in by the body shop or customer
    Draft,
    /// Photos are with the damage analyzer
    Analyzing,
    /// Waiting for an adjuster
    PendingReview,
    Approved,
    Rejected,
    /// Adjuster asked for more information
    SupplementNeeded,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Draft => "draft",
            ClaimStatus::Analyzing => "analyzing",
            ClaimStatus::PendingReview => "pending_review",
            ClaimStatus::Approved => "approved",
            ClaimStatus::Rejected => "rejected",
            ClaimStatus::SupplementNeeded => "supplement_needed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ClaimStatus::Draft => "Draft",
            ClaimStatus::Analyzing => "Analyzing",
            ClaimStatus::PendingReview => "Pending Review",
            ClaimStatus::Approved => "Approved",
            ClaimStatus::Rejected => "Rejected",
            ClaimStatus::SupplementNeeded => "Supplement Needed",
        }
    }

    /// Checks if transition is valid
    ///
    /// Only the guarded operations (analysis start and adjuster review)
    /// consult this table; recording an assessment and submitting move the
    /// claim to pending review unconditionally.
    pub fn can_transition_to(&self, target: ClaimStatus) -> bool {
        use ClaimStatus::*;
        matches!(
            (self, target),
            (Draft, Analyzing)
                | (SupplementNeeded, Analyzing)
                | (Draft, PendingReview)
                | (Analyzing, PendingReview)
                | (SupplementNeeded, PendingReview)
                | (PendingReview, Approved)
                | (PendingReview, Rejected)
                | (PendingReview, SupplementNeeded)
        )
    }
}

/// Adjuster decision on a pending claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    Reject { reason: String },
    RequestSupplement { reason: String },
}

impl ReviewDecision {
    pub fn target_status(&self) -> ClaimStatus {
        match self {
            ReviewDecision::Approve => ClaimStatus::Approved,
            ReviewDecision::Reject { .. } => ClaimStatus::Rejected,
            ReviewDecision::RequestSupplement { .. } => ClaimStatus::SupplementNeeded,
        }
    }
}

/// A collision repair claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub id: ClaimId,
    /// User who created the claim
    pub user_id: UserId,
    pub body_shop_id: Option<UserId>,
    pub customer_id: Option<UserId>,
    pub vehicle: Vehicle,
    #[serde(default)]
    pub photos: Vec<Photo>,
    pub damage_assessment: Option<DamageAssessment>,
    pub estimate: Option<Estimate>,
    pub pre_estimate: Option<PreEstimate>,
    pub status: ClaimStatus,
    pub insurance_info: Option<InsuranceInfo>,
    #[serde(default)]
    pub insurance_info_status: InsuranceInfoStatus,
    #[serde(default)]
    pub insurance_info_flags: Vec<String>,
    pub insurance_info_locked_at: Option<DateTime<Utc>>,
    pub insurance_info_last_edited_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<UserId>,
    pub fraud_score: Option<u8>,
    pub rejection_reason: Option<String>,
}

impl Claim {
    /// Creates a draft claim owned by `creator`
    pub fn new(creator: &User, now: DateTime<Utc>) -> Self {
        Self {
            id: ClaimId::new_v7(),
            user_id: creator.id,
            body_shop_id: (creator.role == UserRole::BodyShop).then_some(creator.id),
            customer_id: (creator.role == UserRole::Customer).then_some(creator.id),
            vehicle: Vehicle::default(),
            photos: Vec::new(),
            damage_assessment: None,
            estimate: None,
            pre_estimate: None,
            status: ClaimStatus::Draft,
            insurance_info: None,
            insurance_info_status: InsuranceInfoStatus::None,
            insurance_info_flags: Vec::new(),
            insurance_info_locked_at: None,
            insurance_info_last_edited_by: None,
            created_at: now,
            updated_at: now,
            submitted_at: None,
            reviewed_at: None,
            reviewed_by: None,
            fraud_score: None,
            rejection_reason: None,
        }
    }

    /// Whether `user` sees this claim in their list
    ///
    /// Body shops and customers see the claims they are party to; adjusters
    /// see everything that has left draft.
    pub fn is_visible_to(&self, user: &User) -> bool {
        match user.role {
            UserRole::BodyShop => self.body_shop_id == Some(user.id) || self.user_id == user.id,
            UserRole::Customer => self.customer_id == Some(user.id) || self.user_id == user.id,
            UserRole::Adjuster => self.status != ClaimStatus::Draft,
        }
    }

    pub fn update_vehicle(&mut self, update: VehicleUpdate, now: DateTime<Utc>) {
        self.vehicle.merge(update);
        self.updated_at = now;
    }

    /// Appends photos; existing photos are kept
    pub fn add_photos(&mut self, photos: Vec<Photo>, now: DateTime<Utc>) {
        self.photos.extend(photos);
        self.updated_at = now;
    }

    /// Marks the claim as being analysed
    pub fn start_analysis(&mut self, now: DateTime<Utc>) -> Result<(), ClaimError> {
        self.transition(ClaimStatus::Analyzing, now)
    }

    /// Stores the assessment, derives the pre-estimate and moves to pending review
    pub fn set_damage_assessment(&mut self, assessment: DamageAssessment, now: DateTime<Utc>) {
        self.pre_estimate = Some(generate_pre_estimate(&assessment));
        self.damage_assessment = Some(assessment);
        self.status = ClaimStatus::PendingReview;
        self.updated_at = now;
    }

    pub fn set_estimate(&mut self, estimate: Estimate, now: DateTime<Utc>) {
        self.estimate = Some(estimate);
        self.updated_at = now;
    }

    /// Submits for adjuster review; resubmitting only refreshes `submitted_at`
    pub fn submit(&mut self, now: DateTime<Utc>) {
        self.submitted_at = Some(now);
        self.status = ClaimStatus::PendingReview;
        self.updated_at = now;
    }

    /// Applies an adjuster decision
    pub fn review(
        &mut self,
        decision: &ReviewDecision,
        reviewer: UserId,
        fraud_score: Option<u8>,
        now: DateTime<Utc>,
    ) -> Result<(), ClaimError> {
        self.transition(decision.target_status(), now)?;
        self.reviewed_at = Some(now);
        self.reviewed_by = Some(reviewer);
        self.fraud_score = fraud_score.map(|s| s.min(100));
        self.rejection_reason = match decision {
            ReviewDecision::Approve => None,
            ReviewDecision::Reject { reason } | ReviewDecision::RequestSupplement { reason } => {
                Some(reason.clone())
            }
        };
        Ok(())
    }

    pub fn is_insurance_locked(&self) -> bool {
        self.insurance_info_locked_at.is_some()
    }

    /// Replaces the insurance info and re-derives its status
    ///
    /// Flags raised by an adjuster survive an edit, so a flagged claim stays flagged.
    pub fn update_insurance_info(
        &mut self,
        info: InsuranceInfo,
        editor: UserId,
        now: DateTime<Utc>,
    ) -> Result<InsuranceInfoStatus, ClaimError> {
        if self.is_insurance_locked() {
            return Err(ClaimError::Locked(self.id.to_string()));
        }
        self.insurance_info_status = if self.insurance_info_flags.is_empty() {
            validate_insurance_info(&info)
        } else {
            InsuranceInfoStatus::Flagged
        };
        self.insurance_info = Some(info);
        self.insurance_info_last_edited_by = Some(editor);
        self.updated_at = now;
        Ok(self.insurance_info_status)
    }

    /// Forces the flagged status; allowed after the lock
    pub fn flag_insurance_info(&mut self, flags: Vec<String>, now: DateTime<Utc>) {
        self.insurance_info_flags = flags;
        self.insurance_info_status = InsuranceInfoStatus::Flagged;
        self.updated_at = now;
    }

    /// Locks insurance fields against further edits; there is no unlock
    pub fn lock_insurance_info(&mut self, now: DateTime<Utc>) -> Result<(), ClaimError> {
        if self.is_insurance_locked() {
            return Err(ClaimError::Locked(self.id.to_string()));
        }
        self.insurance_info_locked_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    fn transition(&mut self, target: ClaimStatus, now: DateTime<Utc>) -> Result<(), ClaimError> {
        if !self.status.can_transition_to(target) {
            return Err(ClaimError::InvalidStatusTransition {
                from: self.status.as_str().to_string(),
                to: target.as_str().to_string(),
            });
        }
        self.status = target;
        self.updated_at = now;
        Ok(())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn locked_insurance_rejects_any_update(
            provider in proptest::option::of("[A-Za-z]{0,10}"),
            policy in proptest::option::of("[A-Z0-9]{0,8}"),
            agent in proptest::option::of("[A-Za-z ]{0,10}")
        ) {
            let shop = User::new(UserRole::BodyShop, "Shop");
            let mut claim = Claim::new(&shop, Utc::now());
            claim.lock_insurance_info(Utc::now()).unwrap();

            let info = InsuranceInfo {
                provider,
                policy_number: policy,
                agent_name: agent,
                ..Default::default()
            };
            let result = claim.update_insurance_info(info, shop.id, Utc::now());
            prop_assert!(matches!(result, Err(ClaimError::Locked(_))));
            prop_assert!(claim.insurance_info.is_none());
        }
    }
}
