//! Appointment book
//!
//! Holds shop schedules and appointments in memory and writes both through
//! to the key-value store on every change. The cache only takes a change
//! after the store has accepted it.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::RwLock;

use core_kernel::{
    AppointmentId, ClaimId, DateRange, KeyValueStore, Notification, NotificationChannel,
    NotificationPort, UserId,
};

use crate::appointment::{
    can_cancel, can_reschedule, Appointment, AppointmentStatus, AppointmentType, DeliveryAddress,
    LoanerCarRequest,
};
use crate::error::SchedulingError;
use crate::schedule::{generate_time_slots, get_available_dates, BodyShopSchedule, SlotAvailability};

pub const APPOINTMENTS_KEY: &str = "appointments";
pub const SCHEDULES_KEY: &str = "schedules";

/// Everything needed to book an appointment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub claim_id: ClaimId,
    pub body_shop_id: UserId,
    pub customer_id: UserId,
    pub date: NaiveDate,
    pub start: NaiveTime,
    #[serde(rename = "type")]
    pub appointment_type: AppointmentType,
    #[serde(default)]
    pub loaner_car_request: Option<LoanerCarRequest>,
    #[serde(default)]
    pub delivery_address: Option<DeliveryAddress>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Default)]
struct BookState {
    loaded: bool,
    schedules: HashMap<UserId, BodyShopSchedule>,
    appointments: HashMap<AppointmentId, Appointment>,
}

pub struct AppointmentBook {
    storage: Arc<dyn KeyValueStore>,
    notifier: Option<Arc<dyn NotificationPort>>,
    state: RwLock<BookState>,
}

impl AppointmentBook {
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            notifier: None,
            state: RwLock::new(BookState::default()),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationPort>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    async fn ensure_loaded(&self, state: &mut BookState) {
        if state.loaded {
            return;
        }
        match self.read::<BodyShopSchedule>(SCHEDULES_KEY).await {
            Ok(schedules) => {
                state.schedules = schedules.into_iter().map(|s| (s.body_shop_id, s)).collect();
            }
            Err(e) => tracing::error!(error = %e, "Failed to load schedules"),
        }
        match self.read::<Appointment>(APPOINTMENTS_KEY).await {
            Ok(appointments) => {
                state.appointments = appointments.into_iter().map(|a| (a.id, a)).collect();
            }
            Err(e) => tracing::error!(error = %e, "Failed to load appointments"),
        }
        state.loaded = true;
    }

    async fn read<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, SchedulingError> {
        match self.storage.get(key).await? {
            Some(bytes) if !bytes.is_empty() => Ok(serde_json::from_slice(&bytes)?),
            _ => Ok(Vec::new()),
        }
    }

    /// Stores all appointments with `staged` in place, then caches it
    async fn commit_appointment(&self, state: &mut BookState, staged: Appointment) -> Result<(), SchedulingError> {
        let bytes = {
            let mut appointments: Vec<&Appointment> = state
                .appointments
                .values()
                .filter(|a| a.id != staged.id)
                .chain(std::iter::once(&staged))
                .collect();
            appointments.sort_by_key(|a| (a.scheduled_date, a.time_slot.start, a.created_at));
            serde_json::to_vec(&appointments)?
        };
        self.storage.set(APPOINTMENTS_KEY, bytes).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to save appointments");
            SchedulingError::from(e)
        })?;
        state.appointments.insert(staged.id, staged);
        Ok(())
    }

    async fn notify(&self, appointment: &Appointment, title: &str, body: String) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        let notification = Notification::new(NotificationChannel::Appointments, title, body)
            .to(appointment.customer_id)
            .with_data(json!({
                "appointment_id": appointment.id,
                "claim_id": appointment.claim_id,
                "status": appointment.status.as_str(),
            }));
        if let Err(e) = notifier.dispatch(notification).await {
            tracing::warn!(appointment_id = %appointment.id, error = %e, "Failed to dispatch appointment notification");
        }
    }

    /// Publishes or replaces a shop's weekly hours
    pub async fn set_schedule(&self, schedule: BodyShopSchedule) -> Result<(), SchedulingError> {
        let mut state = self.state.write().await;
        self.ensure_loaded(&mut state).await;

        let bytes = {
            let schedules: Vec<&BodyShopSchedule> = state
                .schedules
                .values()
                .filter(|s| s.body_shop_id != schedule.body_shop_id)
                .chain(std::iter::once(&schedule))
                .collect();
            serde_json::to_vec(&schedules)?
        };
        self.storage.set(SCHEDULES_KEY, bytes).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to save schedules");
            SchedulingError::from(e)
        })?;

        tracing::info!(body_shop_id = %schedule.body_shop_id, days = schedule.days.len(), "Schedule updated");
        state.schedules.insert(schedule.body_shop_id, schedule);
        Ok(())
    }

    pub async fn schedule(&self, body_shop_id: UserId) -> Result<BodyShopSchedule, SchedulingError> {
        let mut state = self.state.write().await;
        self.ensure_loaded(&mut state).await;
        state
            .schedules
            .get(&body_shop_id)
            .cloned()
            .ok_or_else(|| SchedulingError::NoSchedule(body_shop_id.to_string()))
    }

    /// Slots for one shop-local date with current booking counts
    pub async fn available_slots(
        &self,
        body_shop_id: UserId,
        date: NaiveDate,
    ) -> Result<Vec<SlotAvailability>, SchedulingError> {
        let mut state = self.state.write().await;
        self.ensure_loaded(&mut state).await;
        let schedule = state
            .schedules
            .get(&body_shop_id)
            .ok_or_else(|| SchedulingError::NoSchedule(body_shop_id.to_string()))?;
        let booked = shop_appointments(&state, body_shop_id, None);
        Ok(generate_time_slots(schedule, date, &booked))
    }

    pub async fn available_dates(
        &self,
        body_shop_id: UserId,
        range: &DateRange,
    ) -> Result<Vec<NaiveDate>, SchedulingError> {
        let schedule = self.schedule(body_shop_id).await?;
        Ok(get_available_dates(&schedule, range))
    }

    /// Books a slot if it exists and has capacity
    ///
    /// # Errors
    ///
    /// * `NoSchedule` - the shop has not published hours
    /// * `Validation` - the date is in the past, or a delivery has no complete address
    /// * `InvalidSlot` - no slot starts at the requested time
    /// * `SlotUnavailable` - the slot is at capacity
    pub async fn book(&self, request: BookingRequest, now: DateTime<Utc>) -> Result<Appointment, SchedulingError> {
        if request.appointment_type == AppointmentType::Delivery
            && !request.delivery_address.as_ref().map(|a| a.is_complete()).unwrap_or(false)
        {
            return Err(SchedulingError::validation("delivery appointments need a complete address"));
        }

        let mut state = self.state.write().await;
        self.ensure_loaded(&mut state).await;

        let schedule = state
            .schedules
            .get(&request.body_shop_id)
            .ok_or_else(|| SchedulingError::NoSchedule(request.body_shop_id.to_string()))?;
        if request.date < schedule.timezone.local_date(now) {
            return Err(SchedulingError::validation("cannot book a date in the past"));
        }
        let booked = shop_appointments(&state, request.body_shop_id, None);
        let slot = find_open_slot(schedule, request.date, request.start, &booked)?;

        let appointment = Appointment {
            id: AppointmentId::new_v7(),
            claim_id: request.claim_id,
            body_shop_id: request.body_shop_id,
            customer_id: request.customer_id,
            scheduled_date: request.date,
            time_slot: slot.slot,
            timezone: schedule.timezone,
            appointment_type: request.appointment_type,
            status: AppointmentStatus::Pending,
            loaner_car_request: request.loaner_car_request,
            delivery_address: request.delivery_address,
            notes: request.notes,
            created_at: now,
            updated_at: now,
        };
        self.commit_appointment(&mut state, appointment.clone()).await?;
        drop(state);

        tracing::info!(
            appointment_id = %appointment.id,
            claim_id = %appointment.claim_id,
            date = %appointment.scheduled_date,
            start = %appointment.time_slot.start,
            "Appointment booked"
        );
        self.notify(
            &appointment,
            "Appointment Requested",
            format!(
                "{} requested for {} at {}.",
                appointment.appointment_type.label(),
                appointment.scheduled_date,
                appointment.time_slot.start.format("%H:%M")
            ),
        )
        .await;
        Ok(appointment)
    }

    async fn update<F>(&self, id: AppointmentId, f: F) -> Result<Appointment, SchedulingError>
    where
        F: FnOnce(&mut Appointment, &HashMap<UserId, BodyShopSchedule>, &[Appointment]) -> Result<(), SchedulingError>,
    {
        let mut state = self.state.write().await;
        self.ensure_loaded(&mut state).await;

        let mut staged = state
            .appointments
            .get(&id)
            .cloned()
            .ok_or_else(|| SchedulingError::not_found(id))?;
        let others = shop_appointments(&state, staged.body_shop_id, Some(id));
        f(&mut staged, &state.schedules, &others)?;

        self.commit_appointment(&mut state, staged.clone()).await?;
        Ok(staged)
    }

    /// Shop accepts a pending or rescheduled appointment
    pub async fn confirm(&self, id: AppointmentId, now: DateTime<Utc>) -> Result<Appointment, SchedulingError> {
        let appointment = self
            .update(id, |a, _, _| {
                if !matches!(a.status, AppointmentStatus::Pending | AppointmentStatus::Rescheduled) {
                    return Err(SchedulingError::InvalidStatus { operation: "confirm", status: a.status });
                }
                a.status = AppointmentStatus::Confirmed;
                a.updated_at = now;
                Ok(())
            })
            .await?;

        tracing::info!(appointment_id = %id, "Appointment confirmed");
        self.notify(
            &appointment,
            "Appointment Confirmed",
            format!(
                "Your {} on {} at {} is confirmed.",
                appointment.appointment_type.label().to_lowercase(),
                appointment.scheduled_date,
                appointment.time_slot.start.format("%H:%M")
            ),
        )
        .await;
        Ok(appointment)
    }

    /// Moves the appointment to a new slot and marks it rescheduled
    ///
    /// The current slot is released, so rebooking the same slot is allowed.
    pub async fn reschedule(
        &self,
        id: AppointmentId,
        date: NaiveDate,
        start: NaiveTime,
        now: DateTime<Utc>,
    ) -> Result<Appointment, SchedulingError> {
        let result = self
            .update(id, |a, schedules, others| {
                if a.status.is_terminal() {
                    return Err(SchedulingError::InvalidStatus { operation: "reschedule", status: a.status });
                }
                if !can_reschedule(a, now) {
                    return Err(SchedulingError::RescheduleWindowClosed(a.id.to_string()));
                }
                let schedule = schedules
                    .get(&a.body_shop_id)
                    .ok_or_else(|| SchedulingError::NoSchedule(a.body_shop_id.to_string()))?;
                if date < schedule.timezone.local_date(now) {
                    return Err(SchedulingError::validation("cannot reschedule to a date in the past"));
                }
                let slot = find_open_slot(schedule, date, start, others)?;

                a.scheduled_date = date;
                a.time_slot = slot.slot;
                a.timezone = schedule.timezone;
                a.status = AppointmentStatus::Rescheduled;
                a.updated_at = now;
                Ok(())
            })
            .await;

        let appointment = match result {
            Ok(a) => a,
            Err(e) => {
                tracing::warn!(appointment_id = %id, error = %e, "Reschedule rejected");
                return Err(e);
            }
        };

        tracing::info!(appointment_id = %id, date = %date, start = %start, "Appointment rescheduled");
        self.notify(
            &appointment,
            "Appointment Rescheduled",
            format!(
                "Your appointment moved to {} at {}.",
                appointment.scheduled_date,
                appointment.time_slot.start.format("%H:%M")
            ),
        )
        .await;
        Ok(appointment)
    }

    pub async fn cancel(&self, id: AppointmentId, now: DateTime<Utc>) -> Result<Appointment, SchedulingError> {
        let appointment = self
            .update(id, |a, _, _| {
                if !can_cancel(a) {
                    return Err(SchedulingError::InvalidStatus { operation: "cancel", status: a.status });
                }
                a.status = AppointmentStatus::Cancelled;
                a.updated_at = now;
                Ok(())
            })
            .await?;

        tracing::info!(appointment_id = %id, "Appointment cancelled");
        self.notify(
            &appointment,
            "Appointment Cancelled",
            format!("Your appointment on {} has been cancelled.", appointment.scheduled_date),
        )
        .await;
        Ok(appointment)
    }

    pub async fn complete(&self, id: AppointmentId, now: DateTime<Utc>) -> Result<Appointment, SchedulingError> {
        let appointment = self
            .update(id, |a, _, _| {
                if a.status.is_terminal() {
                    return Err(SchedulingError::InvalidStatus { operation: "complete", status: a.status });
                }
                a.status = AppointmentStatus::Completed;
                a.updated_at = now;
                Ok(())
            })
            .await?;
        tracing::info!(appointment_id = %id, "Appointment completed");
        Ok(appointment)
    }

    pub async fn get(&self, id: AppointmentId) -> Result<Appointment, SchedulingError> {
        let mut state = self.state.write().await;
        self.ensure_loaded(&mut state).await;
        state
            .appointments
            .get(&id)
            .cloned()
            .ok_or_else(|| SchedulingError::not_found(id))
    }

    /// Appointments for a claim in date order
    pub async fn appointments_for_claim(&self, claim_id: ClaimId) -> Vec<Appointment> {
        let mut state = self.state.write().await;
        self.ensure_loaded(&mut state).await;
        let mut appointments: Vec<Appointment> = state
            .appointments
            .values()
            .filter(|a| a.claim_id == claim_id)
            .cloned()
            .collect();
        appointments.sort_by_key(|a| (a.scheduled_date, a.time_slot.start));
        appointments
    }
}

fn shop_appointments(state: &BookState, body_shop_id: UserId, exclude: Option<AppointmentId>) -> Vec<Appointment> {
    state
        .appointments
        .values()
        .filter(|a| a.body_shop_id == body_shop_id && Some(a.id) != exclude)
        .cloned()
        .collect()
}

fn find_open_slot(
    schedule: &BodyShopSchedule,
    date: NaiveDate,
    start: NaiveTime,
    booked: &[Appointment],
) -> Result<SlotAvailability, SchedulingError> {
    let slot = generate_time_slots(schedule, date, booked)
        .into_iter()
        .find(|s| s.slot.start == start)
        .ok_or(SchedulingError::InvalidSlot { date, start })?;
    if !slot.is_available {
        return Err(SchedulingError::SlotUnavailable { date, start });
    }
    Ok(slot)
}
