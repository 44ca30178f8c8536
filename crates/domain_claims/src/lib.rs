//! Claims domain - lifecycle workflow, document reconciliation, verification
//!
//! The claim aggregate owns every transition guard; `reconcile` computes the
//! missing-documents view fresh on each call; ports define the persistence
//! and external-verifier contracts.

pub mod adapters;
pub mod claim;
pub mod error;
pub mod ports;
pub mod reconcile;
pub mod verification;

pub use claim::{Claim, ClaimProfile, ClaimStatus, Decision, PolicyType, UploadedDocument};
pub use error::ClaimError;
pub use ports::ClaimStore;
pub use reconcile::{reconcile, Reconciliation};
pub use verification::{
    DocumentFeedback, VerificationError, VerificationReport, VerificationService,
};
