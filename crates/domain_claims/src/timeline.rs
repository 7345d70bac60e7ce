//! Claim progress timeline

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::claim::{Claim, ClaimStatus};

/// Adjusters aim to review within this many hours of submission
pub const REVIEW_SLA_HOURS: i64 = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineStep {
    Created,
    DamageAnalyzed,
    EstimateGenerated,
    Submitted,
    ReviewComplete,
}

impl TimelineStep {
    pub const ALL: [TimelineStep; 5] = [
        TimelineStep::Created,
        TimelineStep::DamageAnalyzed,
        TimelineStep::EstimateGenerated,
        TimelineStep::Submitted,
        TimelineStep::ReviewComplete,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TimelineStep::Created => "Claim Created",
            TimelineStep::DamageAnalyzed => "Damage Analyzed",
            TimelineStep::EstimateGenerated => "Estimate Generated",
            TimelineStep::Submitted => "Submitted for Review",
            TimelineStep::ReviewComplete => "Review Complete",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub step: TimelineStep,
    pub label: String,
    pub completed: bool,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimTimeline {
    pub steps: Vec<TimelineEntry>,
    /// First step not yet completed; `None` once everything is done
    pub current_step: Option<TimelineStep>,
    pub progress_percent: u8,
    pub status_label: String,
    pub status_description: String,
    /// Expected review decision while pending, expected repair completion once approved
    pub eta: Option<DateTime<Utc>>,
    pub is_overdue: bool,
}

fn status_description(claim: &Claim) -> String {
    match claim.status {
        ClaimStatus::Draft => "Add vehicle details and photos to continue".to_string(),
        ClaimStatus::Analyzing => "Photos are being analyzed for damage".to_string(),
        ClaimStatus::PendingReview => "An adjuster will review your claim".to_string(),
        ClaimStatus::Approved => "Your claim is approved and repairs can begin".to_string(),
        ClaimStatus::Rejected => match &claim.rejection_reason {
            Some(reason) => format!("Your claim was not approved: {}", reason),
            None => "Your claim was not approved".to_string(),
        },
        ClaimStatus::SupplementNeeded => match &claim.rejection_reason {
            Some(reason) => format!("More information is needed: {}", reason),
            None => "More information is needed".to_string(),
        },
    }
}

fn eta(claim: &Claim) -> Option<DateTime<Utc>> {
    match claim.status {
        ClaimStatus::PendingReview => claim
            .submitted_at
            .map(|at| at + Duration::hours(REVIEW_SLA_HOURS)),
        ClaimStatus::Approved => {
            let reviewed_at = claim.reviewed_at?;
            let days = claim.pre_estimate.as_ref()?.repair_days.max;
            Some(reviewed_at + Duration::days(days as i64))
        }
        _ => None,
    }
}

pub fn build_timeline(claim: &Claim, now: DateTime<Utc>) -> ClaimTimeline {
    let review_done = matches!(claim.status, ClaimStatus::Approved | ClaimStatus::Rejected);

    let steps: Vec<TimelineEntry> = TimelineStep::ALL
        .iter()
        .map(|step| {
            let (completed, timestamp) = match step {
                TimelineStep::Created => (true, Some(claim.created_at)),
                TimelineStep::DamageAnalyzed => (claim.damage_assessment.is_some(), None),
                TimelineStep::EstimateGenerated => (
                    claim.estimate.is_some(),
                    claim.estimate.as_ref().map(|e| e.generated_at),
                ),
                TimelineStep::Submitted => (claim.submitted_at.is_some(), claim.submitted_at),
                TimelineStep::ReviewComplete => (review_done, claim.reviewed_at.filter(|_| review_done)),
            };
            TimelineEntry {
                step: *step,
                label: step.label().to_string(),
                completed,
                timestamp,
            }
        })
        .collect();

    let completed = steps.iter().filter(|s| s.completed).count();
    let progress_percent = ((completed as f64 / steps.len() as f64) * 100.0).round() as u8;
    let current_step = steps.iter().find(|s| !s.completed).map(|s| s.step);
    let eta = eta(claim);

    ClaimTimeline {
        steps,
        current_step,
        progress_percent,
        status_label: claim.status.label().to_string(),
        status_description: status_description(claim),
        is_overdue: eta.map(|at| at < now).unwrap_or(false),
        eta,
    }
}
