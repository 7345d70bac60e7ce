//! Claims domain errors

use thiserror::Error;
use core_kernel::PortError;

/// Errors that can occur in the claims domain
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("No authenticated user")]
    Unauthenticated,

    #[error("Not permitted: {0}")]
    Forbidden(String),

    #[error("Insurance information is locked for claim {0}")]
    Locked(String),

    #[error("Claim not found: {0}")]
    ClaimNotFound(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Storage error: {0}")]
    Storage(#[from] PortError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClaimError {
    pub fn not_found(id: impl std::fmt::Display) -> Self {
        ClaimError::ClaimNotFound(id.to_string())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ClaimError::Forbidden(message.into())
    }
}
