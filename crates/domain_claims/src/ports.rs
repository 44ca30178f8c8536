//! Claims domain ports
//!
//! The claim record is the unit of concurrency control. `ClaimStore::update`
//! is a compare-and-swap: it succeeds only when the stored version still
//! matches the version the caller read, so racing writers get exactly one
//! winner. Document uploads bypass the version check and are applied as an
//! atomic upsert keyed by (claim id, normalized document name).

use async_trait::async_trait;

use core_kernel::{ClaimId, HospitalId, PolicyId, StoreError};

use crate::claim::{Claim, ClaimStatus, UploadedDocument};

/// Persistence port for claims
#[async_trait]
pub trait ClaimStore: Send + Sync {
    async fn insert(&self, claim: &Claim) -> Result<(), StoreError>;

    async fn get(&self, id: ClaimId) -> Result<Option<Claim>, StoreError>;

    /// Compare-and-swap update.
    ///
    /// Persists the aggregate with version `expected_version + 1` iff the
    /// stored version equals `expected_version`; otherwise returns
    /// `StoreError::VersionConflict`. Returns the persisted claim.
    async fn update(&self, claim: &Claim, expected_version: i64) -> Result<Claim, StoreError>;

    /// Atomic document upsert keyed by (claim id, normalized name).
    ///
    /// The last writer for a given name wins deterministically; concurrent
    /// uploads of different names never lose data. Applies only while the
    /// claim is in draft; otherwise returns `StoreError::Conflict`.
    async fn upsert_document(
        &self,
        id: ClaimId,
        document: UploadedDocument,
    ) -> Result<Claim, StoreError>;

    /// Claims owned by a hospital, newest first
    async fn list_for_hospital(&self, hospital_id: HospitalId) -> Result<Vec<Claim>, StoreError>;

    /// Claims referencing any of the given policies in the given status
    async fn list_for_policies(
        &self,
        policy_ids: &[PolicyId],
        status: Option<ClaimStatus>,
    ) -> Result<Vec<Claim>, StoreError>;

    /// Removes the claim and its uploaded document references
    async fn delete(&self, id: ClaimId) -> Result<(), StoreError>;
}

/// In-memory implementation of `ClaimStore` for tests.
///
/// Mirrors the CAS semantics of the PostgreSQL adapter, including version
/// bumping and draft-only document upserts, so concurrency tests exercise
/// the same contract.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use crate::reconcile::name_key;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Debug, Default)]
    pub struct MockClaimStore {
        claims: Arc<Mutex<HashMap<ClaimId, Claim>>>,
    }

    impl MockClaimStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl ClaimStore for MockClaimStore {
        async fn insert(&self, claim: &Claim) -> Result<(), StoreError> {
            self.claims.lock().await.insert(claim.id, claim.clone());
            Ok(())
        }

        async fn get(&self, id: ClaimId) -> Result<Option<Claim>, StoreError> {
            Ok(self.claims.lock().await.get(&id).cloned())
        }

        async fn update(&self, claim: &Claim, expected_version: i64) -> Result<Claim, StoreError> {
            let mut claims = self.claims.lock().await;
            let stored = claims
                .get_mut(&claim.id)
                .ok_or_else(|| StoreError::not_found("Claim", claim.id))?;
            if stored.version != expected_version {
                return Err(StoreError::version_conflict(
                    "Claim",
                    claim.id,
                    expected_version,
                ));
            }
            let mut next = claim.clone();
            next.version = expected_version + 1;
            // Documents live in their own keyed rows; a claim-row write
            // never touches them. An upload that landed after the caller's
            // snapshot must survive the swap.
            next.documents = stored.documents.clone();
            *stored = next.clone();
            Ok(next)
        }

        async fn upsert_document(
            &self,
            id: ClaimId,
            document: UploadedDocument,
        ) -> Result<Claim, StoreError> {
            let mut claims = self.claims.lock().await;
            let stored = claims
                .get_mut(&id)
                .ok_or_else(|| StoreError::not_found("Claim", id))?;
            if stored.status != ClaimStatus::Draft {
                return Err(StoreError::Conflict(
                    "documents can only be uploaded while the claim is in draft".to_string(),
                ));
            }
            let key = name_key(&document.document_name);
            if let Some(existing) = stored
                .documents
                .iter_mut()
                .find(|d| name_key(&d.document_name) == key)
            {
                *existing = document;
            } else {
                stored.documents.push(document);
            }
            stored.updated_at = Utc::now();
            Ok(stored.clone())
        }

        async fn list_for_hospital(
            &self,
            hospital_id: HospitalId,
        ) -> Result<Vec<Claim>, StoreError> {
            let claims = self.claims.lock().await;
            let mut out: Vec<_> = claims
                .values()
                .filter(|c| c.hospital_id == hospital_id)
                .cloned()
                .collect();
            out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(out)
        }

        async fn list_for_policies(
            &self,
            policy_ids: &[PolicyId],
            status: Option<ClaimStatus>,
        ) -> Result<Vec<Claim>, StoreError> {
            let claims = self.claims.lock().await;
            let mut out: Vec<_> = claims
                .values()
                .filter(|c| {
                    c.policy_id.map_or(false, |p| policy_ids.contains(&p))
                        && status.map_or(true, |s| c.status == s)
                })
                .cloned()
                .collect();
            out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(out)
        }

        async fn delete(&self, id: ClaimId) -> Result<(), StoreError> {
            self.claims
                .lock()
                .await
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| StoreError::not_found("Claim", id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockClaimStore;
    use super::*;
    use crate::claim::{ClaimProfile, Decision, PolicyType};
    use crate::verification::VerificationReport;
    use chrono::Utc;
    use core_kernel::UserId;
    use std::sync::Arc;

    fn review_ready_claim() -> Claim {
        let mut claim = Claim::new(
            HospitalId::new(),
            ClaimProfile {
                patient_name: "Asha Rao".to_string(),
                age: 41,
                diagnosis: "Appendicitis".to_string(),
                treatment_plan: "Appendectomy".to_string(),
                policy_type: PolicyType::Reimbursement,
                policy_id: None,
            },
        )
        .unwrap();
        claim
            .upsert_document("Discharge Summary", "uploads/ds.pdf")
            .unwrap();
        claim.begin_verification().unwrap();
        claim
            .complete_verification(VerificationReport {
                score: 90,
                estimated_amount: None,
                notes: None,
                document_feedback: Vec::new(),
                ready_for_review: true,
                verified_at: Utc::now(),
            })
            .unwrap();
        claim
            .submit_for_review(&crate::reconcile::reconcile(&[], &claim.documents))
            .unwrap();
        claim
    }

    #[tokio::test]
    async fn cas_update_bumps_version() {
        let store = MockClaimStore::new();
        let claim = review_ready_claim();
        store.insert(&claim).await.unwrap();

        let updated = store.update(&claim, claim.version).await.unwrap();
        assert_eq!(updated.version, claim.version + 1);

        // Stale version loses
        let err = store.update(&claim, claim.version).await.unwrap_err();
        assert!(err.is_version_conflict());
    }

    #[tokio::test]
    async fn concurrent_decides_have_exactly_one_winner() {
        let store = Arc::new(MockClaimStore::new());
        let claim = review_ready_claim();
        store.insert(&claim).await.unwrap();
        let id = claim.id;

        // Reading after the rival committed is already a loss; only a
        // snapshot that passed the domain guard reaches the CAS write.
        let approve = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                let mut snapshot = store.get(id).await.unwrap().unwrap();
                let version = snapshot.version;
                if snapshot
                    .decide(Decision::Approved, None, UserId::new())
                    .is_err()
                {
                    return Err(StoreError::Conflict("already decided".to_string()));
                }
                store.update(&snapshot, version).await
            })
        };
        let reject = {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                let mut snapshot = store.get(id).await.unwrap().unwrap();
                let version = snapshot.version;
                if snapshot
                    .decide(Decision::Rejected, Some("Duplicate claim".into()), UserId::new())
                    .is_err()
                {
                    return Err(StoreError::Conflict("already decided".to_string()));
                }
                store.update(&snapshot, version).await
            })
        };

        let outcomes = [approve.await.unwrap(), reject.await.unwrap()];
        let winners = outcomes.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1, "exactly one decision must persist");

        // The loser re-reads and sees the claim already decided
        let mut persisted = store.get(id).await.unwrap().unwrap();
        assert!(persisted.status.is_terminal());
        let err = persisted
            .decide(Decision::Approved, None, UserId::new())
            .unwrap_err();
        assert!(matches!(err, crate::error::ClaimError::AlreadyDecided { .. }));
    }

    #[tokio::test]
    async fn concurrent_uploads_of_different_names_both_persist() {
        let store = Arc::new(MockClaimStore::new());
        let claim = Claim::new(
            HospitalId::new(),
            ClaimProfile {
                patient_name: "Ben Okafor".to_string(),
                age: 29,
                diagnosis: "Fracture".to_string(),
                treatment_plan: "Cast".to_string(),
                policy_type: PolicyType::Reimbursement,
                policy_id: None,
            },
        )
        .unwrap();
        store.insert(&claim).await.unwrap();
        let id = claim.id;

        let mut handles = Vec::new();
        for name in ["Discharge Summary", "Final Bill", "Lab Results"] {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .upsert_document(
                        id,
                        UploadedDocument {
                            document_name: name.to_string(),
                            storage_reference: format!("uploads/{name}"),
                            uploaded_at: chrono::Utc::now(),
                        },
                    )
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let persisted = store.get(id).await.unwrap().unwrap();
        assert_eq!(persisted.documents.len(), 3);
    }

    #[tokio::test]
    async fn cas_update_keeps_documents_uploaded_after_the_snapshot() {
        let store = MockClaimStore::new();
        let claim = Claim::new(
            HospitalId::new(),
            ClaimProfile {
                patient_name: "Mira Chen".to_string(),
                age: 54,
                diagnosis: "Cholecystitis".to_string(),
                treatment_plan: "Cholecystectomy".to_string(),
                policy_type: PolicyType::Reimbursement,
                policy_id: None,
            },
        )
        .unwrap();
        store.insert(&claim).await.unwrap();

        let snapshot = store.get(claim.id).await.unwrap().unwrap();
        store
            .upsert_document(
                claim.id,
                UploadedDocument {
                    document_name: "Final Bill".to_string(),
                    storage_reference: "uploads/bill.pdf".to_string(),
                    uploaded_at: chrono::Utc::now(),
                },
            )
            .await
            .unwrap();

        // Writing the pre-upload snapshot back must not drop the upload
        let persisted = store.update(&snapshot, snapshot.version).await.unwrap();
        assert_eq!(persisted.documents.len(), 1);
        assert_eq!(persisted.documents[0].document_name, "Final Bill");
    }

    #[tokio::test]
    async fn upload_after_review_ready_is_rejected() {
        let store = MockClaimStore::new();
        let claim = review_ready_claim();
        store.insert(&claim).await.unwrap();

        let err = store
            .upsert_document(
                claim.id,
                UploadedDocument {
                    document_name: "Late Document".to_string(),
                    storage_reference: "uploads/late.pdf".to_string(),
                    uploaded_at: chrono::Utc::now(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }
}
