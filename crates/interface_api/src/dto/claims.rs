//! Claims DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::PolicyId;
use domain_claims::{
    Claim, ClaimProfile, ClaimStatus, Decision, PolicyType, Reconciliation, UploadedDocument,
    VerificationReport,
};
use domain_policy::{Policy, RequiredDocument};

use crate::dto::policy::PolicyResponse;

/// Profile fields for claim creation and draft edits
#[derive(Debug, Deserialize, Validate)]
pub struct ClaimProfileRequest {
    #[validate(length(min = 1, message = "patient_name must not be empty"))]
    pub patient_name: String,
    #[validate(range(min = 0, max = 130, message = "age out of range"))]
    pub age: i32,
    #[validate(length(min = 1, message = "diagnosis must not be empty"))]
    pub diagnosis: String,
    #[validate(length(min = 1, message = "treatment_plan must not be empty"))]
    pub treatment_plan: String,
    pub policy_type: PolicyType,
    pub policy_id: Option<Uuid>,
}

impl ClaimProfileRequest {
    pub fn into_profile(self) -> ClaimProfile {
        ClaimProfile {
            patient_name: self.patient_name,
            age: self.age,
            diagnosis: self.diagnosis,
            treatment_plan: self.treatment_plan,
            policy_type: self.policy_type,
            policy_id: self.policy_id.map(PolicyId::from),
        }
    }
}

/// Registers an uploaded document against the claim. The payload itself
/// lives in the external blob store; only the reference is recorded here.
#[derive(Debug, Deserialize, Validate)]
pub struct UploadDocumentRequest {
    #[validate(length(min = 1, message = "document_name must not be empty"))]
    pub document_name: String,
    #[validate(length(min = 1, message = "storage_reference must not be empty"))]
    pub storage_reference: String,
}

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub decision: Decision,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListClaimsQuery {
    pub status: Option<ClaimStatus>,
}

#[derive(Debug, Serialize)]
pub struct DocumentView {
    pub document_name: String,
    pub storage_reference: String,
    pub uploaded_at: DateTime<Utc>,
}

impl From<&UploadedDocument> for DocumentView {
    fn from(doc: &UploadedDocument) -> Self {
        Self {
            document_name: doc.document_name.clone(),
            storage_reference: doc.storage_reference.clone(),
            uploaded_at: doc.uploaded_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClaimResponse {
    pub id: Uuid,
    pub hospital_id: Uuid,
    pub patient_name: String,
    pub age: i32,
    pub diagnosis: String,
    pub treatment_plan: String,
    pub policy_type: PolicyType,
    pub policy_id: Option<Uuid>,
    pub documents: Vec<DocumentView>,
    pub verification: Option<VerificationReport>,
    pub status: ClaimStatus,
    pub rejection_reason: Option<String>,
    pub decided_by: Option<Uuid>,
    pub decided_at: Option<DateTime<Utc>>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Claim> for ClaimResponse {
    fn from(claim: &Claim) -> Self {
        Self {
            id: claim.id.into(),
            hospital_id: claim.hospital_id.into(),
            patient_name: claim.patient_name.clone(),
            age: claim.age,
            diagnosis: claim.diagnosis.clone(),
            treatment_plan: claim.treatment_plan.clone(),
            policy_type: claim.policy_type,
            policy_id: claim.policy_id.map(Into::into),
            documents: claim.documents.iter().map(DocumentView::from).collect(),
            verification: claim.verification.clone(),
            status: claim.status,
            rejection_reason: claim.rejection_reason.clone(),
            decided_by: claim.decided_by.map(Into::into),
            decided_at: claim.decided_at,
            version: claim.version,
            created_at: claim.created_at,
            updated_at: claim.updated_at,
        }
    }
}

/// Full claim view: the claim, the resolved policy, its requirement
/// checklist, and a freshly computed reconciliation against it
#[derive(Debug, Serialize)]
pub struct ClaimDetailResponse {
    #[serde(flatten)]
    pub claim: ClaimResponse,
    /// The resolved policy; null for claims without a usable reference
    pub policy: Option<PolicyResponse>,
    pub required_documents: Vec<RequiredDocument>,
    pub missing_documents: Vec<String>,
    pub optional_outstanding: Vec<String>,
}

impl ClaimDetailResponse {
    pub fn new(claim: &Claim, policy: Option<&Policy>, reconciliation: &Reconciliation) -> Self {
        Self {
            claim: ClaimResponse::from(claim),
            policy: policy.map(PolicyResponse::from),
            required_documents: policy
                .map(|p| p.required_documents.clone())
                .unwrap_or_default(),
            missing_documents: reconciliation.missing_names(),
            optional_outstanding: reconciliation
                .optional_outstanding
                .iter()
                .map(|d| d.name.clone())
                .collect(),
        }
    }
}
