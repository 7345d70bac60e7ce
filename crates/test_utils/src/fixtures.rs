//! Pre-built Test Fixtures
//!
//! Ready-to-use test data for the claims system. Values are fixed so tests
//! can assert on them directly.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use core_kernel::{Currency, MemoryKeyValueStore, Money, RecordingNotifier, SeededRandom, Timezone, UserId};
use domain_claims::{ClaimStore, InsuranceInfo, StoreConfig, User, UserRole};
use domain_estimate::{
    DamageArea, DamageAssessment, DetectedDamage, Photo, PhotoAngle, RepairType, Severity,
    Vehicle, VehicleUpdate,
};
use domain_messaging::MessagingService;
use domain_scheduling::{AppointmentBook, BodyShopSchedule, DaySchedule};
use rust_decimal_macros::dec;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    pub fn usd_100() -> Money {
        Money::new(dec!(100.00), Currency::USD)
    }

    /// Just under the auto-approval threshold
    pub fn usd_4999() -> Money {
        Money::new(dec!(4999.99), Currency::USD)
    }

    pub fn usd_zero() -> Money {
        Money::zero(Currency::USD)
    }

    /// For currency mismatch tests
    pub fn cad_100() -> Money {
        Money::new(dec!(100.00), Currency::CAD)
    }
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Saturday 2024-06-01 12:00 UTC
    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    /// The Monday after [`TemporalFixtures::now`]
    pub fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    /// The Sunday after [`TemporalFixtures::now`]; shops are closed
    pub fn sunday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 2).unwrap()
    }

    pub fn time(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }
}

/// Fixture for signed-in users
pub struct UserFixtures;

impl UserFixtures {
    pub fn body_shop() -> User {
        User::new(UserRole::BodyShop, "Main Street Collision")
    }

    pub fn adjuster() -> User {
        User::new(UserRole::Adjuster, "Sam Reyes")
    }

    pub fn customer() -> User {
        User::new(UserRole::Customer, "Pat Morgan")
    }
}

/// Fixture for vehicles
pub struct VehicleFixtures;

impl VehicleFixtures {
    pub fn camry() -> Vehicle {
        Vehicle::new(2021, "Toyota", "Camry")
            .with_vin("4T1B11HK5MU123456")
            .with_mileage(32_000)
    }

    pub fn camry_update() -> VehicleUpdate {
        VehicleUpdate {
            year: Some(2021),
            make: Some("Toyota".to_string()),
            model: Some("Camry".to_string()),
            vin: Some("4T1B11HK5MU123456".to_string()),
            mileage: Some(32_000),
            ..Default::default()
        }
    }

    /// Make and model missing
    pub fn incomplete() -> Vehicle {
        Vehicle::default()
    }
}

/// Fixture for claim photos
pub struct PhotoFixtures;

impl PhotoFixtures {
    pub fn front() -> Photo {
        Photo::new("file:///photos/front.jpg", Some(PhotoAngle::Front)).with_dimensions(1920, 1080)
    }

    pub fn front_driver_corner() -> Photo {
        Photo::new("file:///photos/front-driver.jpg", Some(PhotoAngle::FrontDriverCorner))
            .with_dimensions(1920, 1080)
    }

    pub fn closeup() -> Photo {
        Photo::new("file:///photos/closeup.jpg", None)
    }

    /// A front and a front-corner shot
    pub fn front_collision() -> Vec<Photo> {
        vec![Self::front(), Self::front_driver_corner()]
    }
}

/// Fixture for damage assessments
pub struct DamageFixtures;

impl DamageFixtures {
    pub fn damage(area: DamageArea, severity: Severity) -> DetectedDamage {
        let parts = area.parts();
        let count = match severity {
            Severity::Minor => 1,
            Severity::Moderate => 2,
            Severity::Severe => parts.len(),
        }
        .min(parts.len());
        DetectedDamage {
            area,
            severity,
            confidence: 0.85,
            affected_parts: parts[..count].iter().map(|p| p.to_string()).collect(),
            repair_type: if severity == Severity::Severe {
                RepairType::Replace
            } else {
                RepairType::Repair
            },
        }
    }

    /// Moderate front bumper plus minor hood
    pub fn front_collision() -> DamageAssessment {
        DamageAssessment {
            detected_damages: vec![
                Self::damage(DamageArea::FrontBumper, Severity::Moderate),
                Self::damage(DamageArea::Hood, Severity::Minor),
            ],
            confidence: 0.85,
            potential_hidden_damage: Vec::new(),
            processing_time_ms: 2000,
        }
    }

    pub fn empty() -> DamageAssessment {
        DamageAssessment {
            detected_damages: Vec::new(),
            confidence: 0.0,
            potential_hidden_damage: Vec::new(),
            processing_time_ms: 1500,
        }
    }
}

/// Fixture for insurance info
pub struct InsuranceFixtures;

impl InsuranceFixtures {
    /// Provider and policy number only
    pub fn geico_partial() -> InsuranceInfo {
        InsuranceInfo::new("Geico", "GC-4471-0098")
    }

    pub fn geico_complete() -> InsuranceInfo {
        Self::geico_partial().with_agent_name("Dana Whitfield")
    }
}

/// Fixture for body shop hours
pub struct ScheduleFixtures;

impl ScheduleFixtures {
    /// Weekdays 08:00-17:00 with a 12:00-13:00 lunch break, hourly slots
    pub fn weekday_shop(body_shop_id: UserId) -> BodyShopSchedule {
        [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri]
            .into_iter()
            .fold(BodyShopSchedule::new(body_shop_id, Timezone::default()), |schedule, weekday| {
                schedule.with_day(
                    DaySchedule::new(weekday, TemporalFixtures::time(8, 0), TemporalFixtures::time(17, 0))
                        .with_break(TemporalFixtures::time(12, 0), TemporalFixtures::time(13, 0)),
                )
            })
    }
}

/// Services wired onto one in-memory store with a recording notifier
pub struct TestServices {
    pub storage: Arc<MemoryKeyValueStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub claims: ClaimStore,
    pub appointments: AppointmentBook,
    pub messaging: MessagingService,
}

impl TestServices {
    pub fn new() -> Self {
        let storage = Arc::new(MemoryKeyValueStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        Self {
            claims: ClaimStore::new(storage.clone(), StoreConfig::default()).with_notifier(notifier.clone()),
            appointments: AppointmentBook::new(storage.clone()).with_notifier(notifier.clone()),
            messaging: MessagingService::new(storage.clone()).with_notifier(notifier.clone()),
            storage,
            notifier,
        }
    }

    /// A fresh claim store over the same storage, as after a restart
    pub fn reopen_claims(&self) -> ClaimStore {
        ClaimStore::new(self.storage.clone(), StoreConfig::default())
    }
}

impl Default for TestServices {
    fn default() -> Self {
        Self::new()
    }
}

/// Deterministic random source for reproducible mock output
pub fn seeded_rng() -> SeededRandom {
    SeededRandom::from_seed(42)
}
