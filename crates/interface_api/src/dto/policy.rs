//! Policy DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_policy::{Policy, PolicyOwner, PolicyStatus, RequiredDocument};

/// Insurer-created policy with an explicit, confirmed checklist
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePolicyRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    pub required_documents: Vec<RequiredDocument>,
    pub coverage_notes: Option<String>,
}

/// Hospital-created draft policy; the checklist is seeded by the analyzer
/// from the referenced policy document
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDraftPolicyRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "source_document must not be empty"))]
    pub source_document: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRequirementsRequest {
    pub required_documents: Vec<RequiredDocument>,
}

/// Owner-confirmed checklist; activates the policy
#[derive(Debug, Deserialize)]
pub struct FinalizePolicyRequest {
    pub required_documents: Vec<RequiredDocument>,
}

#[derive(Debug, Deserialize)]
pub struct ConnectHospitalsRequest {
    pub hospital_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct PolicyResponse {
    pub id: Uuid,
    pub name: String,
    pub owner: PolicyOwner,
    pub status: PolicyStatus,
    pub required_documents: Vec<RequiredDocument>,
    pub connected_hospital_ids: Vec<Uuid>,
    pub coverage_notes: Option<String>,
    pub source_document: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Policy> for PolicyResponse {
    fn from(policy: &Policy) -> Self {
        Self {
            id: policy.id.into(),
            name: policy.name.clone(),
            owner: policy.owner,
            status: policy.status,
            required_documents: policy.required_documents.clone(),
            connected_hospital_ids: policy
                .connected_hospital_ids
                .iter()
                .map(|h| (*h).into())
                .collect(),
            coverage_notes: policy.coverage_notes.clone(),
            source_document: policy.source_document.clone(),
            created_at: policy.created_at,
            updated_at: policy.updated_at,
        }
    }
}
