//! HTTP adapter for the external verification service
//!
//! Sends the claim, its referenced policy, and the uploaded document list to
//! the verifier over REST and maps the response onto `VerificationReport`.
//!
//! # Error mapping
//!
//! - request timeout -> `VerificationError::Timeout`
//! - connection/5xx -> `VerificationError::Unavailable`
//! - undecodable body -> `VerificationError::Malformed`
//!
//! The caller persists the AWAITING_VERIFICATION marker before invoking this
//! adapter and re-acquires the claim afterwards; no lock is held for the
//! duration of the call.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use domain_policy::Policy;

use crate::claim::Claim;
use crate::verification::{
    DocumentFeedback, VerificationError, VerificationReport, VerificationService,
};

/// Configuration for the verification client
#[derive(Debug, Clone)]
pub struct HttpVerifierConfig {
    /// Base URL of the verifier API
    pub base_url: String,
    /// API key sent as a bearer credential
    pub api_key: String,
    /// Request timeout in seconds; the call never blocks past this bound
    pub timeout_secs: u64,
}

impl Default for HttpVerifierConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            timeout_secs: 60,
        }
    }
}

/// Reqwest-based client for the verification service
#[derive(Debug, Clone)]
pub struct HttpVerificationClient {
    config: HttpVerifierConfig,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    claim: &'a Claim,
    policy: Option<&'a Policy>,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    score: i32,
    estimated_amount: Option<Decimal>,
    notes: Option<String>,
    #[serde(default)]
    document_feedback: Vec<FeedbackEntry>,
    ready_for_review: bool,
}

#[derive(Debug, Deserialize)]
struct FeedbackEntry {
    document_name: String,
    note: String,
}

impl HttpVerificationClient {
    /// Creates a new client
    ///
    /// # Errors
    ///
    /// Returns `VerificationError::Unavailable` if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(config: HttpVerifierConfig) -> Result<Self, VerificationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| VerificationError::Unavailable(e.to_string()))?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl VerificationService for HttpVerificationClient {
    async fn verify(
        &self,
        claim: &Claim,
        policy: Option<&Policy>,
    ) -> Result<VerificationReport, VerificationError> {
        let url = format!("{}/verify", self.config.base_url.trim_end_matches('/'));

        tracing::debug!(claim_id = %claim.id, %url, "Requesting claim verification");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&VerifyRequest { claim, policy })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    VerificationError::Timeout
                } else {
                    VerificationError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(VerificationError::Unavailable(format!(
                "verifier returned {status}"
            )));
        }

        let body: VerifyResponse = response
            .json()
            .await
            .map_err(|e| VerificationError::Malformed(e.to_string()))?;

        if !(0..=100).contains(&body.score) {
            return Err(VerificationError::Malformed(format!(
                "score out of range: {}",
                body.score
            )));
        }

        Ok(VerificationReport {
            score: body.score,
            estimated_amount: body.estimated_amount,
            notes: body.notes,
            document_feedback: body
                .document_feedback
                .into_iter()
                .map(|f| DocumentFeedback {
                    document_name: f.document_name,
                    note: f.note,
                })
                .collect(),
            ready_for_review: body.ready_for_review,
            verified_at: Utc::now(),
        })
    }
}
