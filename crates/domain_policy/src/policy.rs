//! Policy aggregate
//!
//! A policy owns an ordered, named checklist of required documents. The
//! checklist starts as an AI-suggested draft and becomes usable by claims
//! only after the owner confirms it (DRAFT -> ACTIVE).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{CompanyId, HospitalId, PolicyId};

use crate::error::PolicyError;

/// Policy lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyStatus {
    /// AI-suggested checklist not yet confirmed; editable by the owner
    Draft,
    /// Confirmed checklist; usable by claims for gating
    Active,
}

/// Exactly one party owns a policy: an insurer, or a hospital for its
/// internal policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum PolicyOwner {
    Insurer(CompanyId),
    Hospital(HospitalId),
}

impl PolicyOwner {
    pub fn company_id(&self) -> Option<CompanyId> {
        match self {
            PolicyOwner::Insurer(id) => Some(*id),
            PolicyOwner::Hospital(_) => None,
        }
    }

    pub fn hospital_id(&self) -> Option<HospitalId> {
        match self {
            PolicyOwner::Insurer(_) => None,
            PolicyOwner::Hospital(id) => Some(*id),
        }
    }
}

/// One entry of a policy's document checklist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredDocument {
    /// Name, unique within the set; displayed verbatim by callers
    pub name: String,
    /// What the document is
    pub description: String,
    /// Free-form notes (e.g. where the suggestion came from)
    pub notes: Option<String>,
    /// Mandatory documents block progression to review; optional ones are
    /// advisory only
    pub mandatory: bool,
}

impl RequiredDocument {
    pub fn mandatory(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            notes: None,
            mandatory: true,
        }
    }

    pub fn optional(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            notes: None,
            mandatory: false,
        }
    }
}

/// A policy and its document requirement set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    /// Unique identifier
    pub id: PolicyId,
    /// Display name
    pub name: String,
    /// Owning party
    pub owner: PolicyOwner,
    /// Lifecycle status
    pub status: PolicyStatus,
    /// Ordered requirement set; names unique within the set
    pub required_documents: Vec<RequiredDocument>,
    /// Hospitals the insurer has connected to this policy. Authorization
    /// input, maintained by the owning insurer. Hospital-owned policies keep
    /// their own hospital here.
    pub connected_hospital_ids: Vec<HospitalId>,
    /// Free-form coverage notes
    pub coverage_notes: Option<String>,
    /// Storage reference of the PDF the draft checklist was seeded from
    pub source_document: Option<String>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Policy {
    /// Creates a hospital-owned draft policy seeded with an AI-suggested
    /// checklist. The owning hospital is connected implicitly.
    pub fn draft(
        name: impl Into<String>,
        hospital_id: HospitalId,
        suggested: Vec<RequiredDocument>,
        source_document: Option<String>,
    ) -> Result<Self, PolicyError> {
        validate_requirements(&suggested)?;
        let now = Utc::now();
        Ok(Self {
            id: PolicyId::new_v7(),
            name: name.into(),
            owner: PolicyOwner::Hospital(hospital_id),
            status: PolicyStatus::Draft,
            required_documents: suggested,
            connected_hospital_ids: vec![hospital_id],
            coverage_notes: None,
            source_document,
            created_at: now,
            updated_at: now,
        })
    }

    /// Creates an insurer-owned policy with an explicitly confirmed
    /// checklist; it is active immediately.
    pub fn active(
        name: impl Into<String>,
        company_id: CompanyId,
        required_documents: Vec<RequiredDocument>,
        coverage_notes: Option<String>,
    ) -> Result<Self, PolicyError> {
        validate_requirements(&required_documents)?;
        let now = Utc::now();
        Ok(Self {
            id: PolicyId::new_v7(),
            name: name.into(),
            owner: PolicyOwner::Insurer(company_id),
            status: PolicyStatus::Active,
            required_documents,
            connected_hospital_ids: Vec::new(),
            coverage_notes,
            source_document: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replaces the draft checklist. Rejected once the policy is active.
    pub fn set_requirements(&mut self, documents: Vec<RequiredDocument>) -> Result<(), PolicyError> {
        if self.status != PolicyStatus::Draft {
            return Err(PolicyError::NotDraft);
        }
        validate_requirements(&documents)?;
        self.required_documents = documents;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Confirms the checklist and activates the policy (DRAFT -> ACTIVE)
    pub fn finalize(&mut self, confirmed: Vec<RequiredDocument>) -> Result<(), PolicyError> {
        if self.status != PolicyStatus::Draft {
            return Err(PolicyError::AlreadyFinalized);
        }
        validate_requirements(&confirmed)?;
        self.required_documents = confirmed;
        self.status = PolicyStatus::Active;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Replaces the connected hospital set. Insurer-owned policies only.
    pub fn connect_hospitals(&mut self, hospital_ids: Vec<HospitalId>) -> Result<(), PolicyError> {
        if !matches!(self.owner, PolicyOwner::Insurer(_)) {
            return Err(PolicyError::NotInsurerOwned);
        }
        self.connected_hospital_ids = hospital_ids;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// True when the given hospital may reference this policy on a claim
    pub fn usable_by(&self, hospital_id: HospitalId) -> bool {
        self.status == PolicyStatus::Active
            && (self.owner.hospital_id() == Some(hospital_id)
                || self.connected_hospital_ids.contains(&hospital_id))
    }
}

/// Names must be non-empty and unique within the set; comparison trims and
/// case-folds so "Final Bill" and "final bill " cannot coexist.
fn validate_requirements(documents: &[RequiredDocument]) -> Result<(), PolicyError> {
    let mut seen = std::collections::HashSet::new();
    for doc in documents {
        let key = doc.name.trim().to_lowercase();
        if key.is_empty() {
            return Err(PolicyError::EmptyDocumentName);
        }
        if !seen.insert(key) {
            return Err(PolicyError::DuplicateDocumentName(doc.name.clone()));
        }
    }
    Ok(())
}
