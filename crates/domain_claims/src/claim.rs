//! Claim aggregate and workflow state machine
//!
//! A claim moves DRAFT -> (verification runs, any number of times) ->
//! REVIEW_READY -> APPROVED | REJECTED. All transition guards live here;
//! persistence and authorization are the caller's concern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ClaimId, HospitalId, PolicyId, UserId};

use crate::error::ClaimError;
use crate::reconcile::{name_key, Reconciliation};
use crate::verification::VerificationReport;

/// Claim lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimStatus {
    /// Editable by the owning hospital
    Draft,
    /// Transient: a verification call is in flight
    AwaitingVerification,
    /// Frozen; awaiting the insurer's decision
    ReviewReady,
    /// Terminal
    Approved,
    /// Terminal; carries a rejection reason
    Rejected,
}

impl ClaimStatus {
    /// True for APPROVED and REJECTED
    pub fn is_terminal(&self) -> bool {
        matches!(self, ClaimStatus::Approved | ClaimStatus::Rejected)
    }
}

/// How the claim is settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyType {
    /// Settled directly with the insurer; must reference an active policy
    Cashless,
    /// Patient reimbursement; may proceed without a codified policy
    Reimbursement,
}

/// The insurer's terminal decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Approved,
    Rejected,
}

/// A document uploaded against a claim, one per distinct name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedDocument {
    /// Name as supplied by the uploader, displayed verbatim
    pub document_name: String,
    /// Opaque reference into the external blob store
    pub storage_reference: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Patient and treatment fields, editable only while the claim is in draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimProfile {
    pub patient_name: String,
    pub age: i32,
    pub diagnosis: String,
    pub treatment_plan: String,
    pub policy_type: PolicyType,
    pub policy_id: Option<PolicyId>,
}

/// A patient insurance claim
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    /// Unique identifier
    pub id: ClaimId,
    /// Owning hospital
    pub hospital_id: HospitalId,
    pub patient_name: String,
    pub age: i32,
    pub diagnosis: String,
    pub treatment_plan: String,
    pub policy_type: PolicyType,
    /// Referenced policy; required for cashless claims
    pub policy_id: Option<PolicyId>,
    /// Uploaded documents, unique by normalized name, insertion-ordered
    pub documents: Vec<UploadedDocument>,
    /// Latest verification report; each run replaces it wholesale
    pub verification: Option<VerificationReport>,
    /// Lifecycle state
    pub status: ClaimStatus,
    /// Present iff status is REJECTED
    pub rejection_reason: Option<String>,
    /// Insurer user who decided the claim
    pub decided_by: Option<UserId>,
    pub decided_at: Option<DateTime<Utc>>,
    /// Optimistic-concurrency token, bumped by the store on every update
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Claim {
    /// Creates a new draft claim for the given hospital
    pub fn new(hospital_id: HospitalId, profile: ClaimProfile) -> Result<Self, ClaimError> {
        if profile.policy_type == PolicyType::Cashless && profile.policy_id.is_none() {
            return Err(ClaimError::PolicyRequired);
        }
        let now = Utc::now();
        Ok(Self {
            id: ClaimId::new_v7(),
            hospital_id,
            patient_name: profile.patient_name,
            age: profile.age,
            diagnosis: profile.diagnosis,
            treatment_plan: profile.treatment_plan,
            policy_type: profile.policy_type,
            policy_id: profile.policy_id,
            documents: Vec::new(),
            verification: None,
            status: ClaimStatus::Draft,
            rejection_reason: None,
            decided_by: None,
            decided_at: None,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replaces the profile fields. Permitted only in draft; once the claim
    /// reaches review these fields are frozen.
    pub fn update_profile(&mut self, profile: ClaimProfile) -> Result<(), ClaimError> {
        self.ensure_draft()?;
        if profile.policy_type == PolicyType::Cashless && profile.policy_id.is_none() {
            return Err(ClaimError::PolicyRequired);
        }
        self.patient_name = profile.patient_name;
        self.age = profile.age;
        self.diagnosis = profile.diagnosis;
        self.treatment_plan = profile.treatment_plan;
        self.policy_type = profile.policy_type;
        self.policy_id = profile.policy_id;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Adds a document, or replaces the stored reference and timestamp when a
    /// document with the same normalized name already exists. The set never
    /// holds two entries with the same name.
    pub fn upsert_document(
        &mut self,
        document_name: impl Into<String>,
        storage_reference: impl Into<String>,
    ) -> Result<&UploadedDocument, ClaimError> {
        self.ensure_draft()?;
        let document_name = document_name.into();
        let key = name_key(&document_name);
        let now = Utc::now();
        self.updated_at = now;

        let pos = match self
            .documents
            .iter()
            .position(|d| name_key(&d.document_name) == key)
        {
            Some(pos) => {
                let existing = &mut self.documents[pos];
                existing.document_name = document_name;
                existing.storage_reference = storage_reference.into();
                existing.uploaded_at = now;
                pos
            }
            None => {
                self.documents.push(UploadedDocument {
                    document_name,
                    storage_reference: storage_reference.into(),
                    uploaded_at: now,
                });
                self.documents.len() - 1
            }
        };
        Ok(&self.documents[pos])
    }

    /// Marks a verification call as in flight (DRAFT -> AWAITING_VERIFICATION).
    ///
    /// The marker is persisted before the external call so the record is not
    /// locked for the call's duration. Requires at least one uploaded
    /// document.
    pub fn begin_verification(&mut self) -> Result<(), ClaimError> {
        self.ensure_draft()?;
        if self.documents.is_empty() {
            return Err(ClaimError::NoDocumentsUploaded);
        }
        self.status = ClaimStatus::AwaitingVerification;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Records the verifier's report and returns to draft. The previous
    /// report is replaced entirely; runs never merge.
    pub fn complete_verification(&mut self, report: VerificationReport) -> Result<(), ClaimError> {
        if self.status != ClaimStatus::AwaitingVerification {
            return Err(ClaimError::VerificationNotInFlight);
        }
        self.verification = Some(report);
        self.status = ClaimStatus::Draft;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Returns to draft after a failed verification call, leaving any prior
    /// report untouched. Partial verifier output is never written.
    pub fn abort_verification(&mut self) -> Result<(), ClaimError> {
        if self.status != ClaimStatus::AwaitingVerification {
            return Err(ClaimError::VerificationNotInFlight);
        }
        self.status = ClaimStatus::Draft;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Submits the claim for the insurer's review (DRAFT -> REVIEW_READY).
    ///
    /// Requires the latest verification report to have marked the claim
    /// ready, and the reconciliation against the current policy state to show
    /// no missing mandatory documents. The caller computes `reconciliation`
    /// in the same transaction that persists this transition.
    pub fn submit_for_review(&mut self, reconciliation: &Reconciliation) -> Result<(), ClaimError> {
        self.ensure_draft()?;
        if !reconciliation.is_complete() {
            return Err(ClaimError::MissingMandatoryDocuments {
                missing: reconciliation.missing_names(),
            });
        }
        match &self.verification {
            Some(report) if report.ready_for_review => {}
            _ => return Err(ClaimError::NotReadyForReview),
        }
        self.status = ClaimStatus::ReviewReady;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Applies the insurer's terminal decision (REVIEW_READY -> APPROVED or
    /// REJECTED). Exactly one decision wins; a second attempt sees
    /// `AlreadyDecided`.
    pub fn decide(
        &mut self,
        decision: Decision,
        reason: Option<String>,
        decided_by: UserId,
    ) -> Result<(), ClaimError> {
        if self.status.is_terminal() {
            return Err(ClaimError::AlreadyDecided {
                status: self.status,
            });
        }
        if self.status != ClaimStatus::ReviewReady {
            return Err(ClaimError::NotReviewReady {
                status: self.status,
            });
        }
        let now = Utc::now();
        match decision {
            Decision::Approved => {
                self.status = ClaimStatus::Approved;
                self.rejection_reason = None;
            }
            Decision::Rejected => {
                let reason = reason.map(|r| r.trim().to_string()).unwrap_or_default();
                if reason.is_empty() {
                    return Err(ClaimError::RejectionReasonRequired);
                }
                self.status = ClaimStatus::Rejected;
                self.rejection_reason = Some(reason);
            }
        }
        self.decided_by = Some(decided_by);
        self.decided_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Checks the claim may be deleted. Terminal claims are immutable; the
    /// refusal is explicit, never silent.
    pub fn ensure_deletable(&self) -> Result<(), ClaimError> {
        if self.status.is_terminal() {
            return Err(ClaimError::TerminalClaimImmutable);
        }
        Ok(())
    }

    /// True once the insurer has decided the claim
    pub fn is_decided(&self) -> bool {
        self.status.is_terminal()
    }

    fn ensure_draft(&self) -> Result<(), ClaimError> {
        if self.status != ClaimStatus::Draft {
            return Err(ClaimError::NotDraft {
                status: self.status,
            });
        }
        Ok(())
    }
}
