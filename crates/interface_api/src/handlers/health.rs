//! Health check and token handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use domain_claims::{User, UserRole, CLAIMS_KEY};

use crate::{auth, error::ApiError, AppState};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness check (includes the storage backend)
pub async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, StatusCode> {
    state.storage.get(CLAIMS_KEY).await.map_err(|e| {
        tracing::warn!(error = %e, "Storage not ready");
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    Ok(Json(HealthResponse {
        status: "ready".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct TokenRequest {
    pub role: UserRole,
    #[validate(length(min = 1, max = 128))]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub user: User,
}

/// Issues a token for a new user with the requested role
///
/// Stands in for an identity provider; every call mints a fresh user id.
pub async fn issue_token(
    State(state): State<AppState>,
    Json(request): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    request.validate()?;
    let user = User::new(request.role, request.name);
    let token = auth::create_token(&user, &state.config.jwt_secret, state.config.jwt_expiration_secs)?;
    tracing::info!(user_id = %user.id, role = user.role.as_str(), "Issued token");
    Ok(Json(TokenResponse { token, user }))
}
