//! Comprehensive tests for domain_claims

use chrono::Utc;
use rust_decimal_macros::dec;

use core_kernel::{HospitalId, PolicyId, UserId};

use domain_claims::claim::{Claim, ClaimProfile, ClaimStatus, Decision, PolicyType};
use domain_claims::error::ClaimError;
use domain_claims::reconcile::{reconcile, name_key};
use domain_claims::verification::{DocumentFeedback, VerificationReport};
use domain_policy::RequiredDocument;

fn profile() -> ClaimProfile {
    ClaimProfile {
        patient_name: "Asha Rao".to_string(),
        age: 41,
        diagnosis: "Acute appendicitis".to_string(),
        treatment_plan: "Laparoscopic appendectomy".to_string(),
        policy_type: PolicyType::Cashless,
        policy_id: Some(PolicyId::new_v7()),
    }
}

fn draft_claim() -> Claim {
    Claim::new(HospitalId::new(), profile()).unwrap()
}

fn report(ready: bool) -> VerificationReport {
    VerificationReport {
        score: 85,
        estimated_amount: Some(dec!(120000)),
        notes: Some("Looks consistent".to_string()),
        document_feedback: vec![DocumentFeedback {
            document_name: "Discharge Summary".to_string(),
            note: "Legible and complete".to_string(),
        }],
        ready_for_review: ready,
        verified_at: Utc::now(),
    }
}

// ============================================================================
// Creation and profile edits
// ============================================================================

mod creation {
    use super::*;

    #[test]
    fn new_claim_starts_in_draft() {
        let claim = draft_claim();
        assert_eq!(claim.status, ClaimStatus::Draft);
        assert_eq!(claim.version, 0);
        assert!(claim.documents.is_empty());
        assert!(claim.verification.is_none());
    }

    #[test]
    fn cashless_claim_requires_policy() {
        let mut p = profile();
        p.policy_id = None;
        let err = Claim::new(HospitalId::new(), p).unwrap_err();
        assert!(matches!(err, ClaimError::PolicyRequired));
    }

    #[test]
    fn reimbursement_claim_may_omit_policy() {
        let mut p = profile();
        p.policy_type = PolicyType::Reimbursement;
        p.policy_id = None;
        assert!(Claim::new(HospitalId::new(), p).is_ok());
    }

    #[test]
    fn profile_is_editable_in_draft() {
        let mut claim = draft_claim();
        let mut p = profile();
        p.patient_name = "Asha R. Rao".to_string();
        claim.update_profile(p).unwrap();
        assert_eq!(claim.patient_name, "Asha R. Rao");
    }

    #[test]
    fn profile_is_frozen_after_review_ready() {
        let mut claim = draft_claim();
        claim.upsert_document("Discharge Summary", "uploads/ds").unwrap();
        claim.begin_verification().unwrap();
        claim.complete_verification(report(true)).unwrap();
        claim
            .submit_for_review(&reconcile(&[], &claim.documents))
            .unwrap();

        let err = claim.update_profile(profile()).unwrap_err();
        assert!(matches!(
            err,
            ClaimError::NotDraft {
                status: ClaimStatus::ReviewReady
            }
        ));
    }
}

// ============================================================================
// Document uploads
// ============================================================================

mod documents {
    use super::*;

    #[test]
    fn same_name_replaces_instead_of_duplicating() {
        let mut claim = draft_claim();
        claim.upsert_document("Final Bill", "uploads/v1").unwrap();
        let first_at = claim.documents[0].uploaded_at;

        claim.upsert_document("final bill ", "uploads/v2").unwrap();
        assert_eq!(claim.documents.len(), 1);
        assert_eq!(claim.documents[0].storage_reference, "uploads/v2");
        assert!(claim.documents[0].uploaded_at >= first_at);
    }

    #[test]
    fn distinct_names_accumulate_in_order() {
        let mut claim = draft_claim();
        claim.upsert_document("Discharge Summary", "a").unwrap();
        claim.upsert_document("Final Bill", "b").unwrap();
        let names: Vec<_> = claim.documents.iter().map(|d| d.document_name.as_str()).collect();
        assert_eq!(names, vec!["Discharge Summary", "Final Bill"]);
    }
}

// ============================================================================
// Verification workflow
// ============================================================================

mod verification {
    use super::*;

    #[test]
    fn verification_requires_at_least_one_document() {
        let mut claim = draft_claim();
        let err = claim.begin_verification().unwrap_err();
        assert!(matches!(err, ClaimError::NoDocumentsUploaded));
    }

    #[test]
    fn completed_run_returns_to_draft_with_report() {
        let mut claim = draft_claim();
        claim.upsert_document("Discharge Summary", "a").unwrap();
        claim.begin_verification().unwrap();
        assert_eq!(claim.status, ClaimStatus::AwaitingVerification);

        claim.complete_verification(report(true)).unwrap();
        assert_eq!(claim.status, ClaimStatus::Draft);
        assert!(claim.verification.as_ref().unwrap().ready_for_review);
    }

    #[test]
    fn rerun_replaces_report_entirely() {
        let mut claim = draft_claim();
        claim.upsert_document("Discharge Summary", "a").unwrap();
        claim.begin_verification().unwrap();
        claim.complete_verification(report(false)).unwrap();

        let mut second = report(true);
        second.score = 40;
        second.document_feedback = vec![DocumentFeedback {
            document_name: "Final Bill".to_string(),
            note: "Missing itemization".to_string(),
        }];
        claim.begin_verification().unwrap();
        claim.complete_verification(second).unwrap();

        let stored = claim.verification.as_ref().unwrap();
        assert_eq!(stored.score, 40);
        // Feedback lists are never merged across runs
        assert_eq!(stored.document_feedback.len(), 1);
        assert_eq!(stored.document_feedback[0].document_name, "Final Bill");
    }

    #[test]
    fn aborted_run_keeps_previous_report() {
        let mut claim = draft_claim();
        claim.upsert_document("Discharge Summary", "a").unwrap();
        claim.begin_verification().unwrap();
        claim.complete_verification(report(true)).unwrap();

        claim.begin_verification().unwrap();
        claim.abort_verification().unwrap();
        assert_eq!(claim.status, ClaimStatus::Draft);
        assert_eq!(claim.verification.as_ref().unwrap().score, 85);
    }
}

// ============================================================================
// Submission and decision
// ============================================================================

mod workflow {
    use super::*;

    #[test]
    fn submit_rejected_while_mandatory_documents_missing() {
        let requirements = vec![
            RequiredDocument::mandatory("Discharge Summary", ""),
            RequiredDocument::optional("Photo ID", ""),
        ];
        let mut claim = draft_claim();
        claim.upsert_document("Something Else", "a").unwrap();
        claim.begin_verification().unwrap();
        claim.complete_verification(report(true)).unwrap();

        let recon = reconcile(&requirements, &claim.documents);
        let err = claim.submit_for_review(&recon).unwrap_err();
        match err {
            ClaimError::MissingMandatoryDocuments { missing } => {
                assert_eq!(missing, vec!["Discharge Summary"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // Uploading the mandatory document clears the block
        claim.upsert_document("Discharge Summary", "b").unwrap();
        let recon = reconcile(&requirements, &claim.documents);
        claim.submit_for_review(&recon).unwrap();
        assert_eq!(claim.status, ClaimStatus::ReviewReady);
    }

    #[test]
    fn submit_requires_ready_for_review() {
        let mut claim = draft_claim();
        claim.upsert_document("Discharge Summary", "a").unwrap();
        claim.begin_verification().unwrap();
        claim.complete_verification(report(false)).unwrap();

        let err = claim
            .submit_for_review(&reconcile(&[], &claim.documents))
            .unwrap_err();
        assert!(matches!(err, ClaimError::NotReadyForReview));
    }

    #[test]
    fn submit_without_any_verification_is_rejected() {
        let mut claim = draft_claim();
        claim.upsert_document("Discharge Summary", "a").unwrap();
        let err = claim
            .submit_for_review(&reconcile(&[], &claim.documents))
            .unwrap_err();
        assert!(matches!(err, ClaimError::NotReadyForReview));
    }

    fn review_ready() -> Claim {
        let mut claim = draft_claim();
        claim.upsert_document("Discharge Summary", "a").unwrap();
        claim.begin_verification().unwrap();
        claim.complete_verification(report(true)).unwrap();
        claim
            .submit_for_review(&reconcile(&[], &claim.documents))
            .unwrap();
        claim
    }

    #[test]
    fn approve_records_actor_and_timestamp() {
        let mut claim = review_ready();
        let reviewer = UserId::new();
        claim.decide(Decision::Approved, None, reviewer).unwrap();
        assert_eq!(claim.status, ClaimStatus::Approved);
        assert_eq!(claim.decided_by, Some(reviewer));
        assert!(claim.decided_at.is_some());
        assert!(claim.rejection_reason.is_none());
    }

    #[test]
    fn reject_requires_non_empty_reason() {
        let mut claim = review_ready();
        let err = claim
            .decide(Decision::Rejected, Some("   ".to_string()), UserId::new())
            .unwrap_err();
        assert!(matches!(err, ClaimError::RejectionReasonRequired));
        // Guard failure leaves the claim awaiting review
        assert_eq!(claim.status, ClaimStatus::ReviewReady);

        claim
            .decide(
                Decision::Rejected,
                Some("Policy excludes this procedure".to_string()),
                UserId::new(),
            )
            .unwrap();
        assert_eq!(claim.status, ClaimStatus::Rejected);
        assert_eq!(
            claim.rejection_reason.as_deref(),
            Some("Policy excludes this procedure")
        );
    }

    #[test]
    fn second_decision_sees_already_decided() {
        let mut claim = review_ready();
        claim.decide(Decision::Approved, None, UserId::new()).unwrap();
        let err = claim
            .decide(Decision::Rejected, Some("late".to_string()), UserId::new())
            .unwrap_err();
        assert!(matches!(err, ClaimError::AlreadyDecided { .. }));
    }

    #[test]
    fn decide_on_draft_is_rejected() {
        let mut claim = draft_claim();
        let err = claim
            .decide(Decision::Approved, None, UserId::new())
            .unwrap_err();
        assert!(matches!(err, ClaimError::NotReviewReady { .. }));
    }

    #[test]
    fn terminal_claims_cannot_be_deleted() {
        let mut claim = review_ready();
        assert!(claim.ensure_deletable().is_ok());
        claim.decide(Decision::Approved, None, UserId::new()).unwrap();
        assert!(matches!(
            claim.ensure_deletable().unwrap_err(),
            ClaimError::TerminalClaimImmutable
        ));
    }
}

// ============================================================================
// Reconciliation properties
// ============================================================================

mod reconciliation_properties {
    use super::*;
    use domain_claims::claim::UploadedDocument;
    use proptest::prelude::*;

    fn requirement_strategy() -> impl Strategy<Value = RequiredDocument> {
        ("[A-Za-z ]{1,12}", any::<bool>()).prop_map(|(name, mandatory)| RequiredDocument {
            name,
            description: String::new(),
            notes: None,
            mandatory,
        })
    }

    proptest! {
        #[test]
        fn missing_is_exactly_unuploaded_mandatory(
            requirements in proptest::collection::vec(requirement_strategy(), 0..8),
            upload_names in proptest::collection::vec("[A-Za-z ]{1,12}", 0..8),
        ) {
            let uploads: Vec<UploadedDocument> = upload_names
                .iter()
                .map(|n| UploadedDocument {
                    document_name: n.clone(),
                    storage_reference: String::new(),
                    uploaded_at: Utc::now(),
                })
                .collect();

            let result = reconcile(&requirements, &uploads);
            let uploaded: std::collections::HashSet<String> =
                upload_names.iter().map(|n| name_key(n)).collect();

            let expected_missing: Vec<String> = requirements
                .iter()
                .filter(|r| r.mandatory && !uploaded.contains(&name_key(&r.name)))
                .map(|r| r.name.clone())
                .collect();
            prop_assert_eq!(result.missing_names(), expected_missing);

            // Every requirement lands in exactly one bucket
            prop_assert_eq!(
                result.satisfied.len()
                    + result.missing.len()
                    + result.optional_outstanding.len(),
                requirements.len()
            );

            // Determinism
            prop_assert_eq!(result.clone(), reconcile(&requirements, &uploads));
        }
    }
}
