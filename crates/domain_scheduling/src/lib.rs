//! Scheduling Domain
//!
//! Body shops publish weekly hours; customers book drop-off, inspection,
//! pickup and delivery appointments against the resulting time slots.
//!
//! # Appointment Lifecycle
//!
//! ```text
//! Pending -> Confirmed -> Completed
//!    |           |
//!    +-----------+--> Rescheduled -> Confirmed
//!    |           |
//!    +-----------+--> Cancelled
//! ```

pub mod schedule;
pub mod appointment;
pub mod book;
pub mod error;

pub use schedule::{
    generate_time_slots, get_available_dates, BodyShopSchedule, BreakWindow, DaySchedule,
    SlotAvailability, TimeSlot,
};
pub use appointment::{
    can_cancel, can_reschedule, Appointment, AppointmentStatus, AppointmentType, DeliveryAddress,
    LoanerCarRequest, RESCHEDULE_CUTOFF_HOURS,
};
pub use book::{AppointmentBook, BookingRequest, APPOINTMENTS_KEY, SCHEDULES_KEY};
pub use error::SchedulingError;
