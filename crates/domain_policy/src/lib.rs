//! Policy domain - document requirement sets and their lifecycle

pub mod adapters;
pub mod error;
pub mod policy;
pub mod ports;

pub use error::PolicyError;
pub use policy::{Policy, PolicyOwner, PolicyStatus, RequiredDocument};
pub use ports::{AnalyzerError, PolicyAnalyzer, PolicyStore};
