//! Test Utilities Crate
//!
//! Shared test infrastructure for the collision claims test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built test data and in-memory service wiring
//! - `builders`: Builder patterns for claims and estimates
//! - `assertions`: Custom assertion helpers for domain types
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use assertions::*;
pub use generators::*;
