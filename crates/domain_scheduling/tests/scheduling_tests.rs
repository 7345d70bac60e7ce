//! Tests for domain_scheduling

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};

use core_kernel::{
    AppointmentId, ClaimId, DateRange, MemoryKeyValueStore, NotificationChannel, RecordingNotifier,
    Timezone, UserId,
};
use domain_scheduling::{
    generate_time_slots, get_available_dates, Appointment, AppointmentBook, AppointmentStatus,
    AppointmentType, BodyShopSchedule, BookingRequest, DaySchedule, DeliveryAddress,
    SchedulingError, TimeSlot,
};

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
}

/// Saturday before `monday()`
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn weekday_schedule(shop: UserId, capacity: u32) -> BodyShopSchedule {
    [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri]
        .into_iter()
        .fold(BodyShopSchedule::new(shop, Timezone::default()), |schedule, weekday| {
            schedule.with_day(
                DaySchedule::new(weekday, t(8, 0), t(17, 0))
                    .with_break(t(12, 0), t(13, 0))
                    .with_capacity(capacity),
            )
        })
}

fn request(shop: UserId, customer: UserId, date: NaiveDate, start: NaiveTime) -> BookingRequest {
    BookingRequest {
        claim_id: ClaimId::new(),
        body_shop_id: shop,
        customer_id: customer,
        date,
        start,
        appointment_type: AppointmentType::DropOff,
        loaner_car_request: None,
        delivery_address: None,
        notes: None,
    }
}

// ============================================================================
// Slot Generation Tests
// ============================================================================

mod slot_tests {
    use super::*;

    fn booked(shop: UserId, slot: TimeSlot, status: AppointmentStatus) -> Appointment {
        Appointment {
            id: AppointmentId::new(),
            claim_id: ClaimId::new(),
            body_shop_id: shop,
            customer_id: UserId::new(),
            scheduled_date: monday(),
            time_slot: slot,
            timezone: Timezone::default(),
            appointment_type: AppointmentType::Inspection,
            status,
            loaner_car_request: None,
            delivery_address: None,
            notes: None,
            created_at: now(),
            updated_at: now(),
        }
    }

    #[test]
    fn test_fully_booked_day_has_no_availability() {
        let shop = UserId::new();
        let schedule = weekday_schedule(shop, 1);
        let day = schedule.day(Weekday::Mon).unwrap();
        let appointments: Vec<Appointment> = day
            .slots()
            .into_iter()
            .map(|slot| booked(shop, slot, AppointmentStatus::Confirmed))
            .collect();

        let slots = generate_time_slots(&schedule, monday(), &appointments);
        assert_eq!(slots.len(), 8);
        assert!(slots.iter().all(|s| !s.is_available && s.bookings == 1));
    }

    #[test]
    fn test_unscheduled_day_is_empty() {
        let schedule = weekday_schedule(UserId::new(), 2);
        let sunday = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        assert!(generate_time_slots(&schedule, sunday, &[]).is_empty());
    }

    #[test]
    fn test_cancelled_bookings_do_not_count() {
        let shop = UserId::new();
        let schedule = weekday_schedule(shop, 1);
        let slot = TimeSlot::new(t(9, 0), t(10, 0));
        let appointments = vec![booked(shop, slot, AppointmentStatus::Cancelled)];

        let slots = generate_time_slots(&schedule, monday(), &appointments);
        let nine = slots.iter().find(|s| s.slot.start == t(9, 0)).unwrap();
        assert_eq!(nine.bookings, 0);
        assert!(nine.is_available);
    }

    #[test]
    fn test_available_dates_skip_weekend() {
        let schedule = weekday_schedule(UserId::new(), 2);
        let range = DateRange::starting_at(now().date_naive(), 7);
        let dates = get_available_dates(&schedule, &range);

        assert_eq!(dates.len(), 5);
        assert_eq!(dates[0], monday());
    }
}

// ============================================================================
// Appointment Book Tests
// ============================================================================

mod book_tests {
    use super::*;

    async fn book_with_schedule(capacity: u32) -> (AppointmentBook, UserId) {
        let shop = UserId::new();
        let book = AppointmentBook::new(Arc::new(MemoryKeyValueStore::new()));
        book.set_schedule(weekday_schedule(shop, capacity)).await.unwrap();
        (book, shop)
    }

    #[tokio::test]
    async fn test_capacity_is_enforced() {
        let (book, shop) = book_with_schedule(2).await;

        book.book(request(shop, UserId::new(), monday(), t(9, 0)), now()).await.unwrap();
        book.book(request(shop, UserId::new(), monday(), t(9, 0)), now()).await.unwrap();
        let third = book.book(request(shop, UserId::new(), monday(), t(9, 0)), now()).await;
        assert!(matches!(third, Err(SchedulingError::SlotUnavailable { .. })));

        let slots = book.available_slots(shop, monday()).await.unwrap();
        let nine = slots.iter().find(|s| s.slot.start == t(9, 0)).unwrap();
        assert_eq!(nine.bookings, 2);
        assert!(!nine.is_available);
    }

    #[tokio::test]
    async fn test_booking_rejections() {
        let (book, shop) = book_with_schedule(1).await;
        let customer = UserId::new();

        let lunch = book.book(request(shop, customer, monday(), t(12, 0)), now()).await;
        assert!(matches!(lunch, Err(SchedulingError::InvalidSlot { .. })));

        let past = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap();
        let result = book.book(request(shop, customer, past, t(9, 0)), now()).await;
        assert!(matches!(result, Err(SchedulingError::Validation(_))));

        let result = book.book(request(UserId::new(), customer, monday(), t(9, 0)), now()).await;
        assert!(matches!(result, Err(SchedulingError::NoSchedule(_))));

        let mut delivery = request(shop, customer, monday(), t(9, 0));
        delivery.appointment_type = AppointmentType::Delivery;
        let result = book.book(delivery.clone(), now()).await;
        assert!(matches!(result, Err(SchedulingError::Validation(_))));

        delivery.delivery_address = Some(DeliveryAddress {
            street: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            postal_code: "62701".to_string(),
        });
        assert!(book.book(delivery, now()).await.is_ok());
    }

    #[tokio::test]
    async fn test_confirm_and_complete() {
        let (book, shop) = book_with_schedule(1).await;
        let appointment = book.book(request(shop, UserId::new(), monday(), t(10, 0)), now()).await.unwrap();
        assert_eq!(appointment.status, AppointmentStatus::Pending);

        let confirmed = book.confirm(appointment.id, now()).await.unwrap();
        assert_eq!(confirmed.status, AppointmentStatus::Confirmed);

        let completed = book.complete(appointment.id, now()).await.unwrap();
        assert_eq!(completed.status, AppointmentStatus::Completed);

        assert!(matches!(
            book.cancel(appointment.id, now()).await,
            Err(SchedulingError::InvalidStatus { operation: "cancel", .. })
        ));
    }

    #[tokio::test]
    async fn test_reschedule_moves_slot() {
        let (book, shop) = book_with_schedule(1).await;
        let appointment = book.book(request(shop, UserId::new(), monday(), t(9, 0)), now()).await.unwrap();

        let moved = book.reschedule(appointment.id, monday(), t(14, 0), now()).await.unwrap();
        assert_eq!(moved.status, AppointmentStatus::Rescheduled);
        assert_eq!(moved.time_slot.start, t(14, 0));

        // the original slot is free again
        book.book(request(shop, UserId::new(), monday(), t(9, 0)), now()).await.unwrap();
    }

    #[tokio::test]
    async fn test_reschedule_cutoff() {
        let (book, shop) = book_with_schedule(1).await;
        let appointment = book.book(request(shop, UserId::new(), monday(), t(9, 0)), now()).await.unwrap();

        let late = Utc.with_ymd_and_hms(2024, 6, 3, 7, 30, 0).unwrap();
        let result = book.reschedule(appointment.id, monday(), t(15, 0), late).await;
        assert!(matches!(result, Err(SchedulingError::RescheduleWindowClosed(_))));

        let stored = book.get(appointment.id).await.unwrap();
        assert_eq!(stored.time_slot.start, t(9, 0));
    }

    #[tokio::test]
    async fn test_cancel_frees_capacity() {
        let (book, shop) = book_with_schedule(1).await;
        let appointment = book.book(request(shop, UserId::new(), monday(), t(11, 0)), now()).await.unwrap();

        book.cancel(appointment.id, now()).await.unwrap();
        let again = book.book(request(shop, UserId::new(), monday(), t(11, 0)), now()).await;
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn test_persisted_across_instances() {
        let storage = Arc::new(MemoryKeyValueStore::new());
        let shop = UserId::new();

        let first = AppointmentBook::new(storage.clone());
        first.set_schedule(weekday_schedule(shop, 1)).await.unwrap();
        let appointment = first.book(request(shop, UserId::new(), monday(), t(9, 0)), now()).await.unwrap();

        let second = AppointmentBook::new(storage);
        assert_eq!(second.get(appointment.id).await.unwrap(), appointment);
        assert_eq!(second.appointments_for_claim(appointment.claim_id).await.len(), 1);
        assert!(second.schedule(shop).await.is_ok());
    }

    #[tokio::test]
    async fn test_customer_is_notified() {
        let notifier = Arc::new(RecordingNotifier::new());
        let shop = UserId::new();
        let customer = UserId::new();
        let book = AppointmentBook::new(Arc::new(MemoryKeyValueStore::new())).with_notifier(notifier.clone());
        book.set_schedule(weekday_schedule(shop, 1)).await.unwrap();

        let appointment = book.book(request(shop, customer, monday(), t(9, 0)), now()).await.unwrap();
        book.confirm(appointment.id, now() + Duration::minutes(5)).await.unwrap();

        let sent = notifier.sent().await;
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|n| n.recipient == Some(customer)));
        assert!(sent.iter().all(|n| n.channel == NotificationChannel::Appointments));
        assert_eq!(sent[1].title, "Appointment Confirmed");
    }
}

// ============================================================================
// Storage Failure Tests
// ============================================================================

mod storage_failure_tests {
    use super::*;
    use async_trait::async_trait;
    use core_kernel::{DomainPort, KeyValueStore, PortError};
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryKeyValueStore,
        fail_writes: AtomicBool,
    }

    impl DomainPort for FlakyStore {}

    #[async_trait]
    impl KeyValueStore for FlakyStore {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PortError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), PortError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(PortError::connection("disk full"));
            }
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<(), PortError> {
            self.inner.remove(key).await
        }
    }

    async fn flaky_book() -> (Arc<FlakyStore>, AppointmentBook, UserId) {
        let storage = Arc::new(FlakyStore::default());
        let book = AppointmentBook::new(storage.clone());
        let shop = UserId::new();
        book.set_schedule(weekday_schedule(shop, 1)).await.unwrap();
        (storage, book, shop)
    }

    #[tokio::test]
    async fn test_failed_booking_does_not_hold_the_slot() {
        let (storage, book, shop) = flaky_book().await;
        let request = request(shop, UserId::new(), monday(), t(9, 0));

        storage.fail_writes.store(true, Ordering::SeqCst);
        let result = book.book(request.clone(), now()).await;
        assert!(matches!(result, Err(SchedulingError::Storage(_))));
        assert!(book.appointments_for_claim(request.claim_id).await.is_empty());

        storage.fail_writes.store(false, Ordering::SeqCst);
        assert!(book.book(request, now()).await.is_ok());
    }

    #[tokio::test]
    async fn test_failed_reschedule_keeps_original_slot() {
        let (storage, book, shop) = flaky_book().await;
        let appointment = book.book(request(shop, UserId::new(), monday(), t(9, 0)), now()).await.unwrap();

        storage.fail_writes.store(true, Ordering::SeqCst);
        assert!(book.reschedule(appointment.id, monday(), t(14, 0), now()).await.is_err());
        assert!(book.confirm(appointment.id, now()).await.is_err());

        let stored = book.get(appointment.id).await.unwrap();
        assert_eq!(stored, appointment);
    }

    #[tokio::test]
    async fn test_failed_schedule_update_keeps_previous_hours() {
        let (storage, book, shop) = flaky_book().await;

        storage.fail_writes.store(true, Ordering::SeqCst);
        let result = book.set_schedule(weekday_schedule(shop, 4)).await;
        assert!(result.is_err());

        let slots = book.available_slots(shop, monday()).await.unwrap();
        assert!(slots.iter().all(|s| s.capacity == 1));
    }
}
