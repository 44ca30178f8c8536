//! Policy domain ports
//!
//! `PolicyStore` is the persistence port; `PolicyAnalyzer` is the external
//! collaborator that reads a policy PDF and suggests a draft checklist. Only
//! its input/output contract is part of the core.

use async_trait::async_trait;
use thiserror::Error;

use core_kernel::{CompanyId, HospitalId, PolicyId, StoreError};

use crate::policy::{Policy, RequiredDocument};

/// Persistence port for policies
#[async_trait]
pub trait PolicyStore: Send + Sync {
    async fn insert(&self, policy: &Policy) -> Result<(), StoreError>;

    async fn get(&self, id: PolicyId) -> Result<Option<Policy>, StoreError>;

    /// Persists the current state of the aggregate. Policies are low-churn
    /// and owner-edited only, so they carry no version token; last writer
    /// wins.
    async fn update(&self, policy: &Policy) -> Result<(), StoreError>;

    /// Policies visible to a hospital: its own plus those connected to it
    async fn list_for_hospital(&self, hospital_id: HospitalId) -> Result<Vec<Policy>, StoreError>;

    /// Policies owned by an insurance company
    async fn list_for_company(&self, company_id: CompanyId) -> Result<Vec<Policy>, StoreError>;
}

/// Errors from the external policy analyzer
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("Policy analyzer timed out")]
    Timeout,

    #[error("Policy analyzer unavailable: {0}")]
    Unavailable(String),

    #[error("Policy analyzer returned a malformed response: {0}")]
    Malformed(String),
}

/// External collaborator that seeds a draft checklist from a policy PDF
#[async_trait]
pub trait PolicyAnalyzer: Send + Sync {
    async fn suggest_checklist(
        &self,
        source_document: &str,
    ) -> Result<Vec<RequiredDocument>, AnalyzerError>;
}

/// In-memory implementations for tests
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    #[derive(Debug, Default)]
    pub struct MockPolicyStore {
        policies: Arc<RwLock<HashMap<PolicyId, Policy>>>,
    }

    impl MockPolicyStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl PolicyStore for MockPolicyStore {
        async fn insert(&self, policy: &Policy) -> Result<(), StoreError> {
            self.policies
                .write()
                .await
                .insert(policy.id, policy.clone());
            Ok(())
        }

        async fn get(&self, id: PolicyId) -> Result<Option<Policy>, StoreError> {
            Ok(self.policies.read().await.get(&id).cloned())
        }

        async fn update(&self, policy: &Policy) -> Result<(), StoreError> {
            let mut policies = self.policies.write().await;
            if !policies.contains_key(&policy.id) {
                return Err(StoreError::not_found("Policy", policy.id));
            }
            policies.insert(policy.id, policy.clone());
            Ok(())
        }

        async fn list_for_hospital(
            &self,
            hospital_id: HospitalId,
        ) -> Result<Vec<Policy>, StoreError> {
            let mut out: Vec<_> = self
                .policies
                .read()
                .await
                .values()
                .filter(|p| {
                    p.owner.hospital_id() == Some(hospital_id)
                        || p.connected_hospital_ids.contains(&hospital_id)
                })
                .cloned()
                .collect();
            out.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            Ok(out)
        }

        async fn list_for_company(&self, company_id: CompanyId) -> Result<Vec<Policy>, StoreError> {
            let mut out: Vec<_> = self
                .policies
                .read()
                .await
                .values()
                .filter(|p| p.owner.company_id() == Some(company_id))
                .cloned()
                .collect();
            out.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            Ok(out)
        }
    }

    /// Analyzer that always suggests the same checklist
    #[derive(Debug, Clone)]
    pub struct FixedAnalyzer {
        pub suggestions: Vec<RequiredDocument>,
    }

    impl FixedAnalyzer {
        /// A plausible default suggestion set
        pub fn standard() -> Self {
            Self {
                suggestions: vec![
                    RequiredDocument::mandatory(
                        "Discharge Summary",
                        "Summary of the patient's hospital stay and treatment",
                    ),
                    RequiredDocument::mandatory(
                        "Final Bill",
                        "The itemized final bill provided by the hospital",
                    ),
                    RequiredDocument::mandatory(
                        "Diagnosis Report",
                        "Official document confirming the medical diagnosis",
                    ),
                ],
            }
        }
    }

    #[async_trait]
    impl PolicyAnalyzer for FixedAnalyzer {
        async fn suggest_checklist(
            &self,
            _source_document: &str,
        ) -> Result<Vec<RequiredDocument>, AnalyzerError> {
            Ok(self.suggestions.clone())
        }
    }
}
