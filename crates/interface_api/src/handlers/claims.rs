//! Claims handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use validator::Validate;

use core_kernel::ClaimId;
use domain_claims::{
    analyze_fraud, build_timeline, Claim, ClaimStatus, ClaimTimeline, FraudAnalysis, User,
    UserRole,
};
use domain_estimate::{analyze_photos, Photo};

use crate::dto::claims::*;
use crate::middleware::CurrentUser;
use crate::{error::ApiError, AppState};

/// Loads a claim the user is allowed to see
pub(crate) async fn visible_claim(state: &AppState, user: &User, id: ClaimId) -> Result<Claim, ApiError> {
    let claim = state.claims.get_claim(id).await?;
    if claim.is_visible_to(user) {
        Ok(claim)
    } else {
        Err(ApiError::Forbidden(format!("Claim {} is not visible to this user", id)))
    }
}

fn require_adjuster(user: &User) -> Result<(), ApiError> {
    if user.is_adjuster() {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Adjuster role required".to_string()))
    }
}

/// Creates a draft claim, makes it the caller's active claim and opens its
/// conversation with the caller as first participant
///
/// The claim stands if the conversation cannot be stored; it is created
/// again on the first `POST /conversations` for the claim.
pub async fn create_claim(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<(StatusCode, Json<Claim>), ApiError> {
    let claim = state.claims.create_claim(Some(&user)).await?;
    if let Err(e) = state
        .messaging
        .create_conversation(claim.id, vec![user.id], claim.created_at)
        .await
    {
        tracing::warn!(claim_id = %claim.id, error = %e, "Failed to open claim conversation");
    }
    Ok((StatusCode::CREATED, Json(claim)))
}

/// Lists claims visible to the caller, newest first
pub async fn list_claims(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Claim>>, ApiError> {
    Ok(Json(state.claims.list_claims(&user).await))
}

/// Adjuster work queue, oldest first
pub async fn list_pending(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Claim>>, ApiError> {
    require_adjuster(&user)?;
    Ok(Json(state.claims.claims_with_status(ClaimStatus::PendingReview).await))
}

pub async fn get_active_claim(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Claim>, ApiError> {
    state
        .claims
        .active_claim(&user)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No active claim".to_string()))
}

pub async fn activate_claim(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<ClaimId>,
) -> Result<Json<Claim>, ApiError> {
    let claim = visible_claim(&state, &user, id).await?;
    state.claims.set_active_claim(&user, id).await?;
    Ok(Json(claim))
}

/// Gets a claim by ID
pub async fn get_claim(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<ClaimId>,
) -> Result<Json<Claim>, ApiError> {
    visible_claim(&state, &user, id).await.map(Json)
}

pub async fn delete_claim(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<ClaimId>,
) -> Result<StatusCode, ApiError> {
    visible_claim(&state, &user, id).await?;
    state.claims.delete_claim(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Merges vehicle details into the claim
pub async fn update_vehicle(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<ClaimId>,
    Json(request): Json<UpdateVehicleRequest>,
) -> Result<Json<Claim>, ApiError> {
    request.validate()?;
    visible_claim(&state, &user, id).await?;
    let claim = state.claims.add_vehicle(id, request.into()).await?;
    Ok(Json(claim))
}

pub async fn add_photos(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<ClaimId>,
    Json(request): Json<AddPhotosRequest>,
) -> Result<Json<Claim>, ApiError> {
    request.validate()?;
    visible_claim(&state, &user, id).await?;
    let photos: Vec<Photo> = request.photos.into_iter().map(Photo::from).collect();
    let claim = state.claims.add_photos(id, photos).await?;
    Ok(Json(claim))
}

/// Runs damage analysis over the claim's photos
///
/// The claim sits in `analyzing` for the simulated latency, then moves to
/// pending review with its assessment and pre-estimate attached.
pub async fn analyze_damage(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<ClaimId>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let claim = visible_claim(&state, &user, id).await?;
    if claim.photos.is_empty() {
        return Err(ApiError::Validation("Add at least one photo before analysis".to_string()));
    }

    let claim = state.claims.mark_analyzing(id).await?;
    state.analyzer.simulate_latency().await;

    let assessment = {
        let mut rng = state.rng.lock().await;
        analyze_photos(&claim.photos, &mut *rng)
    };
    tracing::debug!(
        claim_id = %id,
        damages = assessment.detected_damages.len(),
        confidence = assessment.confidence,
        "Damage analysis complete"
    );

    let claim = state.claims.set_damage_assessment(id, assessment).await?;
    Ok(Json(AnalysisResponse {
        pre_estimate: claim.pre_estimate.clone(),
        claim,
    }))
}

pub async fn submit_claim(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<ClaimId>,
) -> Result<Json<Claim>, ApiError> {
    visible_claim(&state, &user, id).await?;
    Ok(Json(state.claims.submit_claim(id, &user).await?))
}

/// Applies an adjuster decision
///
/// When the request carries no fraud score, one is computed from the claim.
pub async fn review_claim(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<ClaimId>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<Claim>, ApiError> {
    request.validate()?;
    require_adjuster(&user)?;
    let fraud_score = match request.fraud_score {
        Some(score) => score,
        None => {
            let claim = state.claims.get_claim(id).await?;
            let mut rng = state.rng.lock().await;
            analyze_fraud(&claim, &mut *rng, Utc::now()).score
        }
    };

    let claim = state
        .claims
        .review_claim(id, request.decision, &user, Some(fraud_score))
        .await?;
    Ok(Json(claim))
}

pub async fn fraud_analysis(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<ClaimId>,
) -> Result<Json<FraudAnalysis>, ApiError> {
    require_adjuster(&user)?;
    let claim = state.claims.get_claim(id).await?;
    let mut rng = state.rng.lock().await;
    Ok(Json(analyze_fraud(&claim, &mut *rng, Utc::now())))
}

pub async fn timeline(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<ClaimId>,
) -> Result<Json<ClaimTimeline>, ApiError> {
    let claim = visible_claim(&state, &user, id).await?;
    Ok(Json(build_timeline(&claim, Utc::now())))
}

/// Replaces the claim's insurance info
///
/// Fails with 409 `locked` once the info is locked, which happens when the
/// body shop submits the claim.
pub async fn update_insurance(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<ClaimId>,
    Json(request): Json<InsuranceInfoRequest>,
) -> Result<Json<InsuranceStatusResponse>, ApiError> {
    request.validate()?;
    visible_claim(&state, &user, id).await?;
    let status = state.claims.update_insurance_info(id, request.into(), &user).await?;
    Ok(Json(InsuranceStatusResponse { status, locked: false }))
}

pub async fn flag_insurance(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<ClaimId>,
    Json(request): Json<FlagInsuranceRequest>,
) -> Result<Json<InsuranceStatusResponse>, ApiError> {
    request.validate()?;
    require_adjuster(&user)?;
    let claim = state.claims.flag_insurance_info(id, request.flags).await?;
    Ok(Json(InsuranceStatusResponse {
        status: claim.insurance_info_status,
        locked: claim.is_insurance_locked(),
    }))
}

/// Locks the insurance info ahead of submission
pub async fn lock_insurance(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<ClaimId>,
) -> Result<Json<InsuranceStatusResponse>, ApiError> {
    if user.role == UserRole::Customer {
        return Err(ApiError::Forbidden("Customers cannot lock insurance info".to_string()));
    }
    visible_claim(&state, &user, id).await?;
    let claim = state.claims.lock_insurance_info(id).await?;
    Ok(Json(InsuranceStatusResponse {
        status: claim.insurance_info_status,
        locked: true,
    }))
}
