//! Request and response bodies

pub mod claims;
pub mod scheduling;
pub mod messaging;
