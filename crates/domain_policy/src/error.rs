//! Policy domain errors

use thiserror::Error;

/// Errors that can occur in the policy domain
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Policy not found: {0}")]
    PolicyNotFound(String),

    #[error("Policy checklist can only be edited while the policy is in draft")]
    NotDraft,

    #[error("Policy has already been finalized")]
    AlreadyFinalized,

    #[error("Policy is not active")]
    NotActive,

    #[error("Duplicate document name in requirement set: {0}")]
    DuplicateDocumentName(String),

    #[error("Required document name must not be empty")]
    EmptyDocumentName,

    #[error("Only insurer-owned policies can be connected to hospitals")]
    NotInsurerOwned,
}
