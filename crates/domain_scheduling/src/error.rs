//! Scheduling domain errors

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;
use core_kernel::{PortError, TemporalError};

use crate::appointment::AppointmentStatus;

#[derive(Debug, Error)]
pub enum SchedulingError {
    #[error("No schedule configured for body shop {0}")]
    NoSchedule(String),

    #[error("No slot starts at {start} on {date}")]
    InvalidSlot { date: NaiveDate, start: NaiveTime },

    #[error("Slot {start} on {date} is fully booked")]
    SlotUnavailable { date: NaiveDate, start: NaiveTime },

    #[error("Appointment not found: {0}")]
    AppointmentNotFound(String),

    #[error("Appointment {0} starts within the reschedule cutoff")]
    RescheduleWindowClosed(String),

    #[error("Cannot {operation} appointment in status {status:?}")]
    InvalidStatus {
        operation: &'static str,
        status: AppointmentStatus,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Temporal(#[from] TemporalError),

    #[error("Storage error: {0}")]
    Storage(#[from] PortError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SchedulingError {
    pub fn not_found(id: impl std::fmt::Display) -> Self {
        SchedulingError::AppointmentNotFound(id.to_string())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        SchedulingError::Validation(message.into())
    }
}
