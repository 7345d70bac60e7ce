//! Scheduling handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use validator::Validate;

use core_kernel::{AppointmentId, ClaimId, DateRange, UserId};
use domain_claims::{User, UserRole};
use domain_scheduling::{Appointment, BodyShopSchedule, BookingRequest};

use crate::dto::scheduling::*;
use crate::handlers::claims::visible_claim;
use crate::middleware::CurrentUser;
use crate::{error::ApiError, AppState};

/// Loads an appointment the user is party to; adjusters see all
async fn party_appointment(state: &AppState, user: &User, id: AppointmentId) -> Result<Appointment, ApiError> {
    let appointment = state.appointments.get(id).await?;
    let is_party = user.is_adjuster()
        || appointment.customer_id == user.id
        || appointment.body_shop_id == user.id;
    if is_party {
        Ok(appointment)
    } else {
        Err(ApiError::Forbidden(format!("Appointment {} belongs to another customer", id)))
    }
}

fn require_shop(user: &User, appointment: &Appointment) -> Result<(), ApiError> {
    if appointment.body_shop_id == user.id {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Only the body shop can do this".to_string()))
    }
}

/// Publishes the caller's weekly hours
pub async fn set_schedule(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(mut schedule): Json<BodyShopSchedule>,
) -> Result<Json<BodyShopSchedule>, ApiError> {
    if user.role != UserRole::BodyShop {
        return Err(ApiError::Forbidden("Body shop role required".to_string()));
    }
    schedule.body_shop_id = user.id;
    state.appointments.set_schedule(schedule.clone()).await?;
    Ok(Json(schedule))
}

pub async fn get_schedule(
    State(state): State<AppState>,
    Path(shop_id): Path<UserId>,
) -> Result<Json<BodyShopSchedule>, ApiError> {
    Ok(Json(state.appointments.schedule(shop_id).await?))
}

pub async fn available_slots(
    State(state): State<AppState>,
    Path(shop_id): Path<UserId>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<SlotsResponse>, ApiError> {
    let slots = state.appointments.available_slots(shop_id, query.date).await?;
    Ok(Json(SlotsResponse { date: query.date, slots }))
}

/// Open days with at least one free slot
pub async fn available_dates(
    State(state): State<AppState>,
    Path(shop_id): Path<UserId>,
    Query(query): Query<DatesQuery>,
) -> Result<Json<Vec<NaiveDate>>, ApiError> {
    query.validate()?;
    let range = DateRange::starting_at(query.from, query.days);
    Ok(Json(state.appointments.available_dates(shop_id, &range).await?))
}

/// Books an appointment for a claim
///
/// A customer always books for themselves.
pub async fn book_appointment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(mut request): Json<BookingRequest>,
) -> Result<(StatusCode, Json<Appointment>), ApiError> {
    visible_claim(&state, &user, request.claim_id).await?;
    if user.role == UserRole::Customer {
        request.customer_id = user.id;
    }
    let appointment = state.appointments.book(request, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

pub async fn get_appointment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<AppointmentId>,
) -> Result<Json<Appointment>, ApiError> {
    party_appointment(&state, &user, id).await.map(Json)
}

pub async fn confirm_appointment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<AppointmentId>,
) -> Result<Json<Appointment>, ApiError> {
    let appointment = party_appointment(&state, &user, id).await?;
    require_shop(&user, &appointment)?;
    Ok(Json(state.appointments.confirm(id, Utc::now()).await?))
}

/// Moves an appointment to a new slot
///
/// Rejected within two hours of the current start time.
pub async fn reschedule_appointment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<AppointmentId>,
    Json(request): Json<RescheduleRequest>,
) -> Result<Json<Appointment>, ApiError> {
    party_appointment(&state, &user, id).await?;
    let appointment = state
        .appointments
        .reschedule(id, request.date, request.start, Utc::now())
        .await?;
    Ok(Json(appointment))
}

pub async fn cancel_appointment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<AppointmentId>,
) -> Result<Json<Appointment>, ApiError> {
    party_appointment(&state, &user, id).await?;
    Ok(Json(state.appointments.cancel(id, Utc::now()).await?))
}

pub async fn complete_appointment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<AppointmentId>,
) -> Result<Json<Appointment>, ApiError> {
    let appointment = party_appointment(&state, &user, id).await?;
    require_shop(&user, &appointment)?;
    Ok(Json(state.appointments.complete(id, Utc::now()).await?))
}

pub async fn appointments_for_claim(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<ClaimId>,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    visible_claim(&state, &user, id).await?;
    Ok(Json(state.appointments.appointments_for_claim(id).await))
}
