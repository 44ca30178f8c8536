//! HTTP adapter for the external checklist analyzer
//!
//! Posts a policy document reference to the analyzer and maps the suggested
//! checklist onto `RequiredDocument` entries. Suggested entries default to
//! mandatory; the owner reviews and confirms them before the policy goes
//! active.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::policy::RequiredDocument;
use crate::ports::{AnalyzerError, PolicyAnalyzer};

/// Configuration for the analyzer client
#[derive(Debug, Clone)]
pub struct HttpAnalyzerConfig {
    /// Base URL of the analyzer API
    pub base_url: String,
    /// API key sent as a bearer credential
    pub api_key: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for HttpAnalyzerConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            timeout_secs: 60,
        }
    }
}

/// Reqwest-based client for the checklist analyzer
#[derive(Debug, Clone)]
pub struct HttpAnalyzerClient {
    config: HttpAnalyzerConfig,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    source_document: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    required_documents: Vec<SuggestedEntry>,
}

#[derive(Debug, Deserialize)]
struct SuggestedEntry {
    name: String,
    #[serde(default)]
    description: String,
    notes: Option<String>,
    #[serde(default = "default_mandatory")]
    mandatory: bool,
}

fn default_mandatory() -> bool {
    true
}

impl HttpAnalyzerClient {
    /// Creates a new client
    ///
    /// # Errors
    ///
    /// Returns `AnalyzerError::Unavailable` if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(config: HttpAnalyzerConfig) -> Result<Self, AnalyzerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AnalyzerError::Unavailable(e.to_string()))?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl PolicyAnalyzer for HttpAnalyzerClient {
    async fn suggest_checklist(
        &self,
        source_document: &str,
    ) -> Result<Vec<RequiredDocument>, AnalyzerError> {
        let url = format!("{}/analyze", self.config.base_url.trim_end_matches('/'));

        tracing::debug!(%url, "Requesting checklist suggestion");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&AnalyzeRequest { source_document })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AnalyzerError::Timeout
                } else {
                    AnalyzerError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalyzerError::Unavailable(format!(
                "analyzer returned {status}"
            )));
        }

        let body: AnalyzeResponse = response
            .json()
            .await
            .map_err(|e| AnalyzerError::Malformed(e.to_string()))?;

        Ok(body
            .required_documents
            .into_iter()
            .map(|s| RequiredDocument {
                name: s.name,
                description: s.description,
                notes: s.notes,
                mandatory: s.mandatory,
            })
            .collect())
    }
}
