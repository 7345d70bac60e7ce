//! Claims workflow: status-change notifications and the auto-approval signal

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;

use core_kernel::{Notification, NotificationChannel};
use crate::claim::{Claim, ClaimStatus};

/// Estimates below this total are flagged as eligible for auto-approval
pub const AUTO_APPROVAL_THRESHOLD: Decimal = dec!(5000);

/// Whether the claim's estimate falls under the auto-approval threshold
///
/// This is an eligibility signal only. Approval still goes through an
/// adjuster review; no code path transitions status on this flag.
// TODO: route eligible claims through an automatic ReviewDecision::Approve once
// the carrier-side approval rules are defined.
pub fn is_auto_approval_eligible(claim: &Claim) -> bool {
    claim
        .estimate
        .as_ref()
        .map(|e| e.total.amount() < AUTO_APPROVAL_THRESHOLD)
        .unwrap_or(false)
}

fn vehicle_name(claim: &Claim) -> String {
    let name = claim.vehicle.display_name();
    if name.is_empty() {
        "your vehicle".to_string()
    } else {
        name
    }
}

/// Notifications to send when a claim enters `status`
///
/// Submissions are broadcast to adjusters; review outcomes go to the body
/// shop and the customer on the claim.
pub fn notifications_for_status(claim: &Claim, status: ClaimStatus) -> Vec<Notification> {
    let data = json!({ "claim_id": claim.id, "status": status.as_str() });
    let vehicle = vehicle_name(claim);

    let (title, body) = match status {
        ClaimStatus::PendingReview => (
            "Claim Submitted".to_string(),
            format!("Claim for {} has been submitted for review.", vehicle),
        ),
        ClaimStatus::Approved => (
            "Claim Approved".to_string(),
            format!("The claim for {} has been approved.", vehicle),
        ),
        ClaimStatus::Rejected => (
            "Claim Update".to_string(),
            match &claim.rejection_reason {
                Some(reason) => format!("The claim for {} was not approved: {}", vehicle, reason),
                None => format!("The claim for {} was not approved.", vehicle),
            },
        ),
        ClaimStatus::SupplementNeeded => (
            "Additional Information Needed".to_string(),
            match &claim.rejection_reason {
                Some(reason) => format!("The adjuster needs more information on {}: {}", vehicle, reason),
                None => format!("The adjuster needs more information on {}.", vehicle),
            },
        ),
        ClaimStatus::Draft | ClaimStatus::Analyzing => return Vec::new(),
    };

    let template = Notification::new(NotificationChannel::ClaimUpdates, title, body).with_data(data);

    if status == ClaimStatus::PendingReview {
        return vec![template];
    }

    let mut recipients = Vec::new();
    for id in [claim.body_shop_id, claim.customer_id, Some(claim.user_id)].into_iter().flatten() {
        if !recipients.contains(&id) {
            recipients.push(id);
        }
    }
    recipients
        .into_iter()
        .map(|id| template.clone().to(id))
        .collect()
}
