//! Test Data Builders
//!
//! Builders for claims and policies in a given lifecycle state, so tests
//! specify only the fields they care about.

use core_kernel::{CompanyId, HospitalId, PolicyId};
use domain_claims::{Claim, ClaimProfile, PolicyType};
use domain_policy::{Policy, RequiredDocument};

use crate::fixtures::{passing_report, patient_name, standard_checklist};

/// Builder for test claims
pub struct TestClaimBuilder {
    hospital_id: HospitalId,
    patient_name: String,
    age: i32,
    diagnosis: String,
    treatment_plan: String,
    policy_type: PolicyType,
    policy_id: Option<PolicyId>,
    documents: Vec<(String, String)>,
}

impl Default for TestClaimBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestClaimBuilder {
    pub fn new() -> Self {
        Self {
            hospital_id: HospitalId::new(),
            patient_name: patient_name(),
            age: 42,
            diagnosis: "Acute appendicitis".to_string(),
            treatment_plan: "Laparoscopic appendectomy".to_string(),
            policy_type: PolicyType::Reimbursement,
            policy_id: None,
            documents: Vec::new(),
        }
    }

    pub fn with_hospital(mut self, hospital_id: HospitalId) -> Self {
        self.hospital_id = hospital_id;
        self
    }

    pub fn with_age(mut self, age: i32) -> Self {
        self.age = age;
        self
    }

    /// Makes the claim cashless against the given policy
    pub fn cashless(mut self, policy_id: PolicyId) -> Self {
        self.policy_type = PolicyType::Cashless;
        self.policy_id = Some(policy_id);
        self
    }

    pub fn with_document(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        let reference = format!("uploads/{}", name.to_lowercase().replace(' ', "-"));
        self.documents.push((name, reference));
        self
    }

    /// Builds a draft claim
    pub fn build(self) -> Claim {
        let mut claim = Claim::new(
            self.hospital_id,
            ClaimProfile {
                patient_name: self.patient_name,
                age: self.age,
                diagnosis: self.diagnosis,
                treatment_plan: self.treatment_plan,
                policy_type: self.policy_type,
                policy_id: self.policy_id,
            },
        )
        .expect("builder produced an invalid claim");
        for (name, reference) in self.documents {
            claim
                .upsert_document(name, reference)
                .expect("draft claim accepts uploads");
        }
        claim
    }

    /// Builds a claim carrying a passing verification report, still in draft
    pub fn build_verified(self) -> Claim {
        let mut claim = self.build();
        claim.begin_verification().expect("draft with documents");
        claim
            .complete_verification(passing_report())
            .expect("verification in flight");
        claim
    }
}

/// Builder for test policies
pub struct TestPolicyBuilder {
    name: String,
    required_documents: Vec<RequiredDocument>,
    connected: Vec<HospitalId>,
}

impl Default for TestPolicyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestPolicyBuilder {
    pub fn new() -> Self {
        Self {
            name: "Gold Cashless Plan".to_string(),
            required_documents: standard_checklist(),
            connected: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_requirements(mut self, documents: Vec<RequiredDocument>) -> Self {
        self.required_documents = documents;
        self
    }

    pub fn connected_to(mut self, hospital_id: HospitalId) -> Self {
        self.connected.push(hospital_id);
        self
    }

    /// Builds an active insurer-owned policy
    pub fn build_insurer(self, company_id: CompanyId) -> Policy {
        let mut policy = Policy::active(
            self.name,
            company_id,
            self.required_documents,
            None,
        )
        .expect("builder produced an invalid policy");
        if !self.connected.is_empty() {
            policy
                .connect_hospitals(self.connected)
                .expect("insurer policy accepts connections");
        }
        policy
    }

    /// Builds a hospital-owned draft policy
    pub fn build_hospital_draft(self, hospital_id: HospitalId) -> Policy {
        Policy::draft(self.name, hospital_id, self.required_documents, None)
            .expect("builder produced an invalid policy")
    }
}
