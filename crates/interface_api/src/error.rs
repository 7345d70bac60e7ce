//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use domain_claims::ClaimError;
use domain_estimate::EstimateError;
use domain_messaging::MessagingError;
use domain_scheduling::SchedulingError;

use crate::auth::AuthError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Locked: {0}")]
    Locked(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", "Unauthorized".to_string()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::Locked(msg) => (StatusCode::CONFLICT, "locked", msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone()),
            ApiError::Storage(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error", msg.clone()),
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg.clone()),
        };

        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details: None,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ClaimError> for ApiError {
    fn from(err: ClaimError) -> Self {
        match err {
            ClaimError::Unauthenticated => ApiError::Unauthorized,
            ClaimError::Forbidden(msg) => ApiError::Forbidden(msg),
            ClaimError::Locked(id) => ApiError::Locked(format!("Insurance information is locked for claim {}", id)),
            ClaimError::ClaimNotFound(id) => ApiError::NotFound(format!("Claim not found: {}", id)),
            e @ ClaimError::InvalidStatusTransition { .. } => ApiError::Conflict(e.to_string()),
            e @ (ClaimError::Storage(_) | ClaimError::Serialization(_)) => ApiError::Storage(e.to_string()),
        }
    }
}

impl From<EstimateError> for ApiError {
    fn from(err: EstimateError) -> Self {
        match err {
            EstimateError::Money(e) => ApiError::Internal(e.to_string()),
            e => ApiError::Validation(e.to_string()),
        }
    }
}

impl From<SchedulingError> for ApiError {
    fn from(err: SchedulingError) -> Self {
        match err {
            e @ (SchedulingError::NoSchedule(_) | SchedulingError::AppointmentNotFound(_)) => {
                ApiError::NotFound(e.to_string())
            }
            e @ (SchedulingError::SlotUnavailable { .. }
            | SchedulingError::RescheduleWindowClosed(_)
            | SchedulingError::InvalidStatus { .. }) => ApiError::Conflict(e.to_string()),
            e @ (SchedulingError::InvalidSlot { .. }
            | SchedulingError::Validation(_)
            | SchedulingError::Temporal(_)) => ApiError::Validation(e.to_string()),
            e @ (SchedulingError::Storage(_) | SchedulingError::Serialization(_)) => {
                ApiError::Storage(e.to_string())
            }
        }
    }
}

impl From<MessagingError> for ApiError {
    fn from(err: MessagingError) -> Self {
        match err {
            e @ (MessagingError::ConversationNotFound(_) | MessagingError::MessageNotFound(_)) => {
                ApiError::NotFound(e.to_string())
            }
            e @ MessagingError::NotParticipant { .. } => ApiError::Forbidden(e.to_string()),
            e @ MessagingError::EmptyMessage => ApiError::Validation(e.to_string()),
            e @ (MessagingError::Storage(_) | MessagingError::Serialization(_)) => {
                ApiError::Storage(e.to_string())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(_: AuthError) -> Self {
        ApiError::Unauthorized
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::Validation(err.to_string())
    }
}
