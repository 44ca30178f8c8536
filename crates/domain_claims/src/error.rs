//! Claims domain errors
//!
//! Guard failures are typed so the API layer can render the unmet
//! precondition by name instead of a generic message.

use thiserror::Error;

use crate::claim::ClaimStatus;

/// Errors that can occur in the claims domain
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("Claim not found: {0}")]
    ClaimNotFound(String),

    #[error("Claim is not editable in status {status:?}")]
    NotDraft { status: ClaimStatus },

    #[error("A cashless claim must reference a policy")]
    PolicyRequired,

    #[error("At least one document must be uploaded before verification")]
    NoDocumentsUploaded,

    #[error("Missing mandatory documents: {}", missing.join(", "))]
    MissingMandatoryDocuments { missing: Vec<String> },

    #[error("Claim has not been marked ready for review by verification")]
    NotReadyForReview,

    #[error("Claim is not awaiting a decision (status {status:?})")]
    NotReviewReady { status: ClaimStatus },

    #[error("Claim has already been decided ({status:?})")]
    AlreadyDecided { status: ClaimStatus },

    #[error("A rejection requires a non-empty reason")]
    RejectionReasonRequired,

    #[error("No verification is in flight for this claim")]
    VerificationNotInFlight,

    #[error("A decided claim cannot be deleted")]
    TerminalClaimImmutable,
}

impl ClaimError {
    /// Machine-readable reason string rendered alongside the human message
    pub fn reason_code(&self) -> &'static str {
        match self {
            ClaimError::ClaimNotFound(_) => "CLAIM_NOT_FOUND",
            ClaimError::NotDraft { .. } => "NOT_DRAFT",
            ClaimError::PolicyRequired => "POLICY_REQUIRED",
            ClaimError::NoDocumentsUploaded => "NO_DOCUMENTS_UPLOADED",
            ClaimError::MissingMandatoryDocuments { .. } => "MISSING_MANDATORY_DOCUMENTS",
            ClaimError::NotReadyForReview => "NOT_READY_FOR_REVIEW",
            ClaimError::NotReviewReady { .. } => "NOT_REVIEW_READY",
            ClaimError::AlreadyDecided { .. } => "ALREADY_DECIDED",
            ClaimError::RejectionReasonRequired => "REJECTION_REASON_REQUIRED",
            ClaimError::VerificationNotInFlight => "VERIFICATION_NOT_IN_FLIGHT",
            ClaimError::TerminalClaimImmutable => "TERMINAL_CLAIM_IMMUTABLE",
        }
    }
}
