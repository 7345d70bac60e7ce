//! Scheduling DTOs

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use validator::Validate;

use domain_scheduling::SlotAvailability;

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct SlotsResponse {
    pub date: NaiveDate,
    pub slots: Vec<SlotAvailability>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DatesQuery {
    pub from: NaiveDate,
    #[validate(range(min = 1, max = 90))]
    pub days: u32,
}

#[derive(Debug, Deserialize)]
pub struct RescheduleRequest {
    pub date: NaiveDate,
    pub start: NaiveTime,
}
