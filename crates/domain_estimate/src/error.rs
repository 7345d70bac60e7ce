//! Estimating domain errors

use thiserror::Error;
use core_kernel::MoneyError;

#[derive(Debug, Error)]
pub enum EstimateError {
    #[error("Vehicle information incomplete: {0}")]
    IncompleteVehicle(String),

    #[error("No damage detected; nothing to estimate")]
    NoDamageDetected,

    #[error("Money error: {0}")]
    Money(#[from] MoneyError),
}

impl EstimateError {
    pub fn incomplete_vehicle(message: impl Into<String>) -> Self {
        EstimateError::IncompleteVehicle(message.into())
    }
}
