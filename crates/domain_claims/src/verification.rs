//! AI verification contract
//!
//! The verifier's business logic is external and opaque; only its
//! input/output shapes matter here. A report is written atomically or not at
//! all - a failed call leaves the claim's previous report in place.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use domain_policy::Policy;

use crate::claim::Claim;

/// Per-document annotation from the verifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFeedback {
    pub document_name: String,
    pub note: String,
}

/// One complete verification run. Re-running replaces the whole report;
/// feedback lists are never merged across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Confidence score, 0-100
    pub score: i32,
    /// Estimated payable amount
    pub estimated_amount: Option<Decimal>,
    /// Free-form analysis notes
    pub notes: Option<String>,
    pub document_feedback: Vec<DocumentFeedback>,
    /// Computed by the external service, never by this engine
    pub ready_for_review: bool,
    pub verified_at: DateTime<Utc>,
}

/// Errors from the external verification service
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("Verification service timed out")]
    Timeout,

    #[error("Verification service unavailable: {0}")]
    Unavailable(String),

    #[error("Verification service returned a malformed response: {0}")]
    Malformed(String),
}

/// External collaborator that scores a claim and annotates its documents
#[async_trait]
pub trait VerificationService: Send + Sync {
    /// Runs one verification pass. The call is bounded by the adapter's
    /// timeout; callers must not hold the claim record locked across it.
    async fn verify(
        &self,
        claim: &Claim,
        policy: Option<&Policy>,
    ) -> Result<VerificationReport, VerificationError>;
}

/// Canned implementations for tests
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Always returns a clone of the configured report
    #[derive(Debug)]
    pub struct StaticVerifier {
        report: VerificationReport,
        calls: AtomicUsize,
    }

    impl StaticVerifier {
        pub fn new(report: VerificationReport) -> Self {
            Self {
                report,
                calls: AtomicUsize::new(0),
            }
        }

        /// A passing report marked ready for review
        pub fn passing() -> Self {
            Self::new(VerificationReport {
                score: 85,
                estimated_amount: None,
                notes: Some("All required documents are present".to_string()),
                document_feedback: Vec::new(),
                ready_for_review: true,
                verified_at: Utc::now(),
            })
        }

        /// Number of verify calls observed
        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl VerificationService for StaticVerifier {
        async fn verify(
            &self,
            _claim: &Claim,
            _policy: Option<&Policy>,
        ) -> Result<VerificationReport, VerificationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.report.clone())
        }
    }

    /// Always fails, simulating an unreachable verifier
    #[derive(Debug, Default)]
    pub struct FailingVerifier;

    #[async_trait]
    impl VerificationService for FailingVerifier {
        async fn verify(
            &self,
            _claim: &Claim,
            _policy: Option<&Policy>,
        ) -> Result<VerificationReport, VerificationError> {
            Err(VerificationError::Unavailable(
                "connection refused".to_string(),
            ))
        }
    }
}
