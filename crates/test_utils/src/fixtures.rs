//! Test fixtures
//!
//! Pre-built checklists and verification reports, plus randomized patient
//! data for tests that want variety without caring about the exact values.

use chrono::Utc;
use fake::faker::lorem::en::Sentence;
use fake::faker::name::en::Name;
use fake::Fake;

use domain_claims::{DocumentFeedback, VerificationReport};
use domain_policy::RequiredDocument;

/// The standard three-document cashless checklist
pub fn standard_checklist() -> Vec<RequiredDocument> {
    vec![
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
    ]
}

/// A checklist with one optional entry appended
pub fn checklist_with_optional() -> Vec<RequiredDocument> {
    let mut checklist = standard_checklist();
    checklist.push(RequiredDocument::optional(
        "Photo ID",
        "Patient identification",
    ));
    checklist
}

/// A verification report marked ready for review
pub fn passing_report() -> VerificationReport {
    VerificationReport {
        score: 88,
        estimated_amount: None,
        notes: Some("All submitted documents are consistent".to_string()),
        document_feedback: Vec::new(),
        ready_for_review: true,
        verified_at: Utc::now(),
    }
}

/// A verification report that withholds the ready flag
pub fn failing_report() -> VerificationReport {
    VerificationReport {
        score: 35,
        estimated_amount: None,
        notes: Some("Inconsistencies between bill and treatment plan".to_string()),
        document_feedback: vec![DocumentFeedback {
            document_name: "Final Bill".to_string(),
            note: "Billed amount does not match the treatment plan".to_string(),
        }],
        ready_for_review: false,
        verified_at: Utc::now(),
    }
}

/// A random patient name
pub fn patient_name() -> String {
    Name().fake()
}

/// A random short diagnosis line
pub fn diagnosis() -> String {
    Sentence(3..6).fake()
}
