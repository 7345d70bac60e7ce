//! Request handlers

pub mod health;
pub mod claims;
pub mod estimates;
pub mod scheduling;
pub mod messaging;
