//! Test Utilities Crate
//!
//! Shared fixtures and builders for the claim lifecycle test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built checklists, reports, and randomized patient data
//! - `builders`: Builder patterns for claims and policies in a given state

pub mod builders;
pub mod fixtures;

pub use builders::*;
pub use fixtures::*;
