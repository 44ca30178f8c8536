//! Party domain errors

use thiserror::Error;

/// Errors that can occur in the party domain
#[derive(Debug, Error)]
pub enum PartyError {
    #[error("Hospital not found: {0}")]
    HospitalNotFound(String),

    #[error("Insurance company not found: {0}")]
    CompanyNotFound(String),

    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    #[error("Invalid account scope: {0}")]
    InvalidAccountScope(String),
}
