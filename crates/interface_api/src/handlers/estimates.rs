//! Estimate handlers

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;

use core_kernel::ClaimId;
use domain_claims::{is_auto_approval_eligible, AUTO_APPROVAL_THRESHOLD};
use domain_estimate::{
    assess_photo_quality, calculate_savings, format_ccc_one, format_estimate, format_mitchell,
    generate_estimate_options, DamageAssessment, EstimateFormat, EstimateTier, PhotoMetadata,
    PhotoQualityReport,
};

use crate::dto::claims::*;
use crate::handlers::claims::visible_claim;
use crate::middleware::CurrentUser;
use crate::{error::ApiError, AppState};

fn require_assessment(assessment: Option<DamageAssessment>) -> Result<DamageAssessment, ApiError> {
    assessment.ok_or_else(|| ApiError::Validation("Claim has no damage assessment yet".to_string()))
}

/// Prices the claim's damage and stores the estimate on the claim
pub async fn generate_estimate(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<ClaimId>,
    request: Option<Json<GenerateEstimateRequest>>,
) -> Result<Json<EstimateResponse>, ApiError> {
    let format = request
        .and_then(|Json(r)| r.format)
        .unwrap_or(EstimateFormat::CccOne);

    let claim = visible_claim(&state, &user, id).await?;
    claim.vehicle.validate()?;
    let assessment = require_assessment(claim.damage_assessment.clone())?;

    let estimate = {
        let mut rng = state.rng.lock().await;
        state
            .estimates
            .generate(&assessment, &claim.vehicle, format, &mut *rng, Utc::now())?
    };
    tracing::info!(claim_id = %id, total = %estimate.total, format = ?format, "Estimate generated");

    let formatted = format_estimate(&estimate, &claim.vehicle);
    let claim = state.claims.set_estimate(id, estimate.clone()).await?;

    Ok(Json(EstimateResponse {
        estimate,
        formatted,
        auto_approval_eligible: is_auto_approval_eligible(&claim),
    }))
}

/// Renders the stored estimate as plain text
///
/// An estimate past its validity date is refused with 409; generate a new one.
pub async fn formatted_estimate(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<ClaimId>,
    Query(query): Query<FormatQuery>,
) -> Result<String, ApiError> {
    let claim = visible_claim(&state, &user, id).await?;
    let estimate = claim
        .estimate
        .as_ref()
        .ok_or_else(|| ApiError::NotFound(format!("No estimate for claim {}", id)))?;
    if estimate.is_expired(Utc::now()) {
        tracing::debug!(claim_id = %id, estimate_id = %estimate.id, "Stored estimate has expired");
        return Err(ApiError::Conflict(format!(
            "Estimate {} expired on {}",
            estimate.id,
            estimate.expires_at.format("%Y-%m-%d")
        )));
    }

    Ok(match query.format {
        Some(EstimateFormat::CccOne) => format_ccc_one(estimate, &claim.vehicle),
        Some(EstimateFormat::Mitchell) => format_mitchell(estimate, &claim.vehicle),
        None => format_estimate(estimate, &claim.vehicle),
    })
}

/// Basic, OEM and premium repair options with the basic tier's savings
pub async fn estimate_options(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<ClaimId>,
) -> Result<Json<EstimateOptionsResponse>, ApiError> {
    let claim = visible_claim(&state, &user, id).await?;
    let assessment = require_assessment(claim.damage_assessment)?;
    let options = generate_estimate_options(&assessment);

    let total_of = |tier: EstimateTier| options.iter().find(|o| o.tier == tier).map(|o| o.total);
    let savings_percent = match (total_of(EstimateTier::Basic), total_of(EstimateTier::Oem)) {
        (Some(basic), Some(oem)) => calculate_savings(basic, oem),
        _ => 0,
    };

    Ok(Json(EstimateOptionsResponse { options, savings_percent }))
}

pub async fn auto_approval(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<ClaimId>,
) -> Result<Json<AutoApprovalResponse>, ApiError> {
    let claim = visible_claim(&state, &user, id).await?;
    Ok(Json(AutoApprovalResponse {
        eligible: is_auto_approval_eligible(&claim),
        threshold: AUTO_APPROVAL_THRESHOLD,
    }))
}

/// Scores a photo before upload
pub async fn photo_quality(
    State(state): State<AppState>,
    Json(metadata): Json<PhotoMetadata>,
) -> Json<PhotoQualityReport> {
    let mut rng = state.rng.lock().await;
    Json(assess_photo_quality(&metadata, &mut *rng))
}
