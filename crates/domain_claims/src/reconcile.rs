//! Document-requirement reconciliation
//!
//! Pure set difference between a policy's requirement set and the documents
//! actually uploaded to a claim. No side effects, no memory of prior calls;
//! the same inputs always produce the same result.
//!
//! Names are matched trimmed and case-insensitively. The policy's checklist
//! is authored by an external analyzer and uploads come from browsers, so
//! exact byte equality would reject "final bill " against "Final Bill".
//! Display names are never normalized, only the comparison key is.

use crate::claim::UploadedDocument;
use domain_policy::RequiredDocument;

/// Normalizes a document name into its comparison key
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Result of reconciling a requirement set against uploads
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Required documents with a matching upload
    pub satisfied: Vec<RequiredDocument>,
    /// Mandatory documents with no matching upload; blocks review
    pub missing: Vec<RequiredDocument>,
    /// Optional documents with no matching upload; advisory only
    pub optional_outstanding: Vec<RequiredDocument>,
}

impl Reconciliation {
    /// True when no mandatory document is outstanding
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// Names of the missing mandatory documents, in checklist order
    pub fn missing_names(&self) -> Vec<String> {
        self.missing.iter().map(|d| d.name.clone()).collect()
    }
}

/// Reconciles a requirement set against uploaded documents.
///
/// An empty requirement set (ad-hoc reimbursement claims without a codified
/// policy) yields an empty `missing` list, never an error. Checklist order is
/// preserved in every output bucket.
pub fn reconcile(
    requirements: &[RequiredDocument],
    uploads: &[UploadedDocument],
) -> Reconciliation {
    let uploaded_keys: std::collections::HashSet<String> =
        uploads.iter().map(|d| name_key(&d.document_name)).collect();

    let mut result = Reconciliation::default();
    for requirement in requirements {
        if uploaded_keys.contains(&name_key(&requirement.name)) {
            result.satisfied.push(requirement.clone());
        } else if requirement.mandatory {
            result.missing.push(requirement.clone());
        } else {
            result.optional_outstanding.push(requirement.clone());
        }
    }
    result
}
