//! Appointments and their lifecycle rules

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{AppointmentId, ClaimId, TemporalError, Timezone, UserId};
use crate::schedule::TimeSlot;

/// Appointments cannot be moved once they are this close to starting
pub const RESCHEDULE_CUTOFF_HOURS: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentType {
    DropOff,
    Inspection,
    Pickup,
    Delivery,
}

impl AppointmentType {
    pub fn label(&self) -> &'static str {
        match self {
            AppointmentType::DropOff => "Vehicle Drop-off",
            AppointmentType::Inspection => "Damage Inspection",
            AppointmentType::Pickup => "Vehicle Pickup",
            AppointmentType::Delivery => "Vehicle Delivery",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    Rescheduled,
}

impl AppointmentStatus {
    /// Completed and cancelled appointments accept no further changes
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Rescheduled => "rescheduled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanerCarRequest {
    pub needed: bool,
    pub preferred_type: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

impl DeliveryAddress {
    pub fn is_complete(&self) -> bool {
        [&self.street, &self.city, &self.state, &self.postal_code]
            .iter()
            .all(|f| !f.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub claim_id: ClaimId,
    pub body_shop_id: UserId,
    pub customer_id: UserId,
    /// Shop-local date
    pub scheduled_date: NaiveDate,
    pub time_slot: TimeSlot,
    /// Shop timezone at booking time, used to place the slot on the UTC timeline
    pub timezone: Timezone,
    #[serde(rename = "type")]
    pub appointment_type: AppointmentType,
    pub status: AppointmentStatus,
    pub loaner_car_request: Option<LoanerCarRequest>,
    pub delivery_address: Option<DeliveryAddress>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Instant the slot starts
    pub fn starts_at(&self) -> Result<DateTime<Utc>, TemporalError> {
        self.timezone.local_to_utc(self.scheduled_date, self.time_slot.start)
    }
}

/// Whether the appointment can still be moved at `now`
///
/// False for completed or cancelled appointments and from two hours before
/// the start onwards.
pub fn can_reschedule(appointment: &Appointment, now: DateTime<Utc>) -> bool {
    if appointment.status.is_terminal() {
        return false;
    }
    match appointment.starts_at() {
        Ok(start) => now < start - Duration::hours(RESCHEDULE_CUTOFF_HOURS),
        Err(_) => false,
    }
}

pub fn can_cancel(appointment: &Appointment) -> bool {
    !appointment.status.is_terminal()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, TimeZone};

    fn appointment_at(date: NaiveDate, hour: u32) -> Appointment {
        let now = Utc::now();
        Appointment {
            id: AppointmentId::new(),
            claim_id: ClaimId::new(),
            body_shop_id: UserId::new(),
            customer_id: UserId::new(),
            scheduled_date: date,
            time_slot: TimeSlot::new(
                NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(hour + 1, 0, 0).unwrap(),
            ),
            timezone: Timezone::default(),
            appointment_type: AppointmentType::DropOff,
            status: AppointmentStatus::Confirmed,
            loaner_car_request: None,
            delivery_address: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_reschedule_cutoff() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let appointment = appointment_at(date, 10);

        let early = Utc.with_ymd_and_hms(2024, 6, 3, 7, 59, 0).unwrap();
        let at_cutoff = Utc.with_ymd_and_hms(2024, 6, 3, 8, 0, 0).unwrap();
        assert!(can_reschedule(&appointment, early));
        assert!(!can_reschedule(&appointment, at_cutoff));
    }

    #[test]
    fn test_terminal_statuses() {
        let date = NaiveDate::from_ymd_opt(2030, 1, 7).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut appointment = appointment_at(date, 9);

        for status in [AppointmentStatus::Pending, AppointmentStatus::Confirmed, AppointmentStatus::Rescheduled] {
            appointment.status = status;
            assert!(can_cancel(&appointment));
            assert!(can_reschedule(&appointment, now));
        }
        for status in [AppointmentStatus::Completed, AppointmentStatus::Cancelled] {
            appointment.status = status;
            assert!(!can_cancel(&appointment));
            assert!(!can_reschedule(&appointment, now));
        }
    }

    #[test]
    fn test_starts_at_uses_shop_timezone() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let mut appointment = appointment_at(date, 9);
        appointment.timezone = Timezone::new(chrono_tz::America::Chicago);

        // CST is UTC-6 in January
        assert_eq!(
            appointment.starts_at().unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 15, 15, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_type_serializes_under_type_key() {
        let appointment = appointment_at(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(), 9);
        let json = serde_json::to_value(&appointment).unwrap();
        assert_eq!(json["type"], "drop_off");
        assert_eq!(json["status"], "confirmed");
    }
}
