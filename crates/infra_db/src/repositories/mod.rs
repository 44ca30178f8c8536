//! Store port implementations

pub mod claims;
pub mod party;
pub mod policies;
