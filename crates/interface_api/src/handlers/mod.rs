//! Request handlers

pub mod claims;
pub mod health;
pub mod party;
pub mod policy;
