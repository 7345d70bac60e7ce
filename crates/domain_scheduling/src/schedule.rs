//! Body shop opening hours and slot availability
//!
//! A shop publishes one [`DaySchedule`] per weekday it is open. Slots are cut
//! at a fixed duration from opening time; a slot that would run past closing
//! is dropped, as is any slot touching a break window.

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use core_kernel::{DateRange, Timezone, UserId};
use crate::appointment::{Appointment, AppointmentStatus};

/// A closed window within the working day, e.g. lunch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl BreakWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub weekday: Weekday,
    pub open: NaiveTime,
    pub close: NaiveTime,
    pub slot_duration_minutes: u32,
    pub breaks: Vec<BreakWindow>,
    pub max_concurrent_appointments: u32,
}

impl DaySchedule {
    pub fn new(weekday: Weekday, open: NaiveTime, close: NaiveTime) -> Self {
        Self {
            weekday,
            open,
            close,
            slot_duration_minutes: 60,
            breaks: Vec::new(),
            max_concurrent_appointments: 1,
        }
    }

    pub fn with_slot_duration(mut self, minutes: u32) -> Self {
        self.slot_duration_minutes = minutes;
        self
    }

    pub fn with_break(mut self, start: NaiveTime, end: NaiveTime) -> Self {
        self.breaks.push(BreakWindow::new(start, end));
        self
    }

    pub fn with_capacity(mut self, max_concurrent: u32) -> Self {
        self.max_concurrent_appointments = max_concurrent;
        self
    }

    /// Slot boundaries for this day, breaks excluded
    pub fn slots(&self) -> Vec<TimeSlot> {
        let step = self.slot_duration_minutes;
        if step == 0 {
            return Vec::new();
        }
        let close = minutes_of(self.close);
        let mut start = minutes_of(self.open);
        let mut slots = Vec::new();

        while start + step <= close {
            if let (Some(s), Some(e)) = (time_of(start), time_of(start + step)) {
                let slot = TimeSlot::new(s, e);
                if !self.breaks.iter().any(|b| slot.overlaps(b)) {
                    slots.push(slot);
                }
            }
            start += step;
        }
        slots
    }
}

fn minutes_of(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

fn time_of(minutes: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
}

/// Weekly opening hours for one body shop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyShopSchedule {
    pub body_shop_id: UserId,
    pub timezone: Timezone,
    pub days: Vec<DaySchedule>,
}

impl BodyShopSchedule {
    pub fn new(body_shop_id: UserId, timezone: Timezone) -> Self {
        Self {
            body_shop_id,
            timezone,
            days: Vec::new(),
        }
    }

    /// Adds or replaces the entry for the day's weekday
    pub fn with_day(mut self, day: DaySchedule) -> Self {
        self.days.retain(|d| d.weekday != day.weekday);
        self.days.push(day);
        self
    }

    pub fn day(&self, weekday: Weekday) -> Option<&DaySchedule> {
        self.days.iter().find(|d| d.weekday == weekday)
    }

    pub fn is_open_on(&self, date: NaiveDate) -> bool {
        self.day(date.weekday()).is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeSlot {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Half-open overlap; a slot ending as a break starts does not overlap it
    pub fn overlaps(&self, window: &BreakWindow) -> bool {
        self.start < window.end && window.start < self.end
    }
}

/// A slot annotated with its current bookings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotAvailability {
    #[serde(flatten)]
    pub slot: TimeSlot,
    pub bookings: u32,
    pub capacity: u32,
    pub is_available: bool,
}

/// Bookable slots for `date`
///
/// # Arguments
///
/// * `schedule` - The shop's weekly hours
/// * `date` - Shop-local calendar date
/// * `appointments` - Existing appointments for the shop; cancelled ones are ignored
///
/// Returns an empty list when the shop has no hours on that weekday.
pub fn generate_time_slots(
    schedule: &BodyShopSchedule,
    date: NaiveDate,
    appointments: &[Appointment],
) -> Vec<SlotAvailability> {
    let Some(day) = schedule.day(date.weekday()) else {
        return Vec::new();
    };

    day.slots()
        .into_iter()
        .map(|slot| {
            let bookings = appointments
                .iter()
                .filter(|a| {
                    a.scheduled_date == date
                        && a.time_slot.start == slot.start
                        && a.status != AppointmentStatus::Cancelled
                })
                .count() as u32;
            SlotAvailability {
                slot,
                bookings,
                capacity: day.max_concurrent_appointments,
                is_available: bookings < day.max_concurrent_appointments,
            }
        })
        .collect()
}

/// Dates in `range` on which the shop is open
pub fn get_available_dates(schedule: &BodyShopSchedule, range: &DateRange) -> Vec<NaiveDate> {
    range.iter_days().filter(|d| schedule.is_open_on(*d)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_slots_skip_lunch() {
        let day = DaySchedule::new(Weekday::Mon, t(8, 0), t(17, 0)).with_break(t(12, 0), t(13, 0));
        let slots = day.slots();

        assert_eq!(slots.len(), 8);
        assert_eq!(slots[0].start, t(8, 0));
        assert!(slots.iter().all(|s| s.start != t(12, 0)));
        assert_eq!(slots.last().unwrap().end, t(17, 0));
    }

    #[test]
    fn test_partial_final_slot_is_dropped() {
        let day = DaySchedule::new(Weekday::Tue, t(9, 0), t(10, 45)).with_slot_duration(30);
        let starts: Vec<_> = day.slots().into_iter().map(|s| s.start).collect();
        assert_eq!(starts, vec![t(9, 0), t(9, 30), t(10, 0)]);
    }

    #[test]
    fn test_break_overlap_is_half_open() {
        let lunch = BreakWindow::new(t(12, 0), t(12, 30));
        assert!(!TimeSlot::new(t(11, 0), t(12, 0)).overlaps(&lunch));
        assert!(TimeSlot::new(t(11, 30), t(12, 15)).overlaps(&lunch));
        assert!(!TimeSlot::new(t(12, 30), t(13, 0)).overlaps(&lunch));
    }

    #[test]
    fn test_zero_duration_yields_nothing() {
        let day = DaySchedule::new(Weekday::Wed, t(8, 0), t(17, 0)).with_slot_duration(0);
        assert!(day.slots().is_empty());
    }

    #[test]
    fn test_with_day_replaces_weekday() {
        let schedule = BodyShopSchedule::new(UserId::new(), Timezone::default())
            .with_day(DaySchedule::new(Weekday::Mon, t(8, 0), t(17, 0)))
            .with_day(DaySchedule::new(Weekday::Mon, t(9, 0), t(12, 0)));
        assert_eq!(schedule.days.len(), 1);
        assert_eq!(schedule.day(Weekday::Mon).unwrap().open, t(9, 0));
    }
}
