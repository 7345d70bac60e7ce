//! Core Kernel - Foundational types and utilities for the collision claims system
//!
//! This crate provides the building blocks used across all domain modules:
//! - Money types with precise decimal arithmetic and increment rounding
//! - Temporal helpers for shop-local time and date ranges
//! - Strongly-typed identifiers
//! - A seedable random source for the mock assessment, pricing and fraud services
//! - Port traits for persistence and notification dispatch

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod random;
pub mod ports;

pub use money::{Money, Currency, MoneyError, Rate};
pub use temporal::{DateRange, Timezone, TemporalError};
pub use identifiers::{
    ClaimId, UserId, PhotoId, EstimateId, AppointmentId,
    ConversationId, MessageId,
};
pub use random::{RandomSource, SeededRandom, SequenceRandom};
pub use ports::{
    PortError, DomainPort, KeyValueStore, MemoryKeyValueStore,
    Notification, NotificationChannel, NotificationPort,
    LoggingNotifier, RecordingNotifier,
};
