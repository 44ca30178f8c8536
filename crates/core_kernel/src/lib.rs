//! Core Kernel - Foundational types and utilities for the claims platform
//!
//! This crate provides the fundamental building blocks used across all domain
//! modules:
//! - Strongly-typed identifiers for claims, policies, and organizations
//! - The shared error type for store ports

pub mod error;
pub mod identifiers;

pub use error::StoreError;
pub use identifiers::{ClaimId, CompanyId, HospitalId, PolicyId, UserId};
