//! End-to-end API tests against in-memory stores
//!
//! Exercises the full HTTP surface: authentication, role/tenancy gating,
//! the claim workflow, reconciliation gating of review submission, and the
//! decision endpoint.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum_test::TestServer;
use serde_json::{json, Value};
use uuid::Uuid;

use core_kernel::{ClaimId, PolicyId, StoreError, UserId};
use domain_claims::ports::mock::MockClaimStore;
use domain_claims::verification::mock::{FailingVerifier, StaticVerifier};
use domain_claims::{
    Claim, ClaimStatus, ClaimStore, Decision, UploadedDocument, VerificationError,
    VerificationReport, VerificationService,
};
use domain_policy::ports::mock::{FixedAnalyzer, MockPolicyStore};
use domain_policy::{Policy, PolicyStore};
use domain_party::ports::mock::MockPartyStore;
use core_kernel::{CompanyId, HospitalId};
use test_utils::TestPolicyBuilder;

use interface_api::{auth::create_token, config::ApiConfig, create_router, AppState};

const SECRET: &str = "test-secret";

struct Harness {
    server: TestServer,
    policies: Arc<MockPolicyStore>,
}

fn harness_with(claims: Arc<dyn ClaimStore>, verifier: Arc<dyn VerificationService>) -> Harness {
    let policies = Arc::new(MockPolicyStore::new());

    let config = ApiConfig {
        jwt_secret: SECRET.to_string(),
        ..ApiConfig::default()
    };
    let state = AppState {
        claims,
        policies: policies.clone(),
        parties: Arc::new(MockPartyStore::new()),
        verifier,
        analyzer: Arc::new(FixedAnalyzer::standard()),
        config,
    };
    let server = TestServer::new(create_router(state)).expect("router builds");
    Harness { server, policies }
}

fn harness_with_verifier(verifier: Arc<dyn VerificationService>) -> Harness {
    harness_with(Arc::new(MockClaimStore::new()), verifier)
}

fn harness() -> Harness {
    harness_with_verifier(Arc::new(StaticVerifier::passing()))
}

/// Verifier that takes a while, standing in for a long external call
struct SlowVerifier {
    delay: Duration,
}

#[async_trait]
impl VerificationService for SlowVerifier {
    async fn verify(
        &self,
        _claim: &Claim,
        _policy: Option<&Policy>,
    ) -> Result<VerificationReport, VerificationError> {
        tokio::time::sleep(self.delay).await;
        Ok(VerificationReport {
            score: 85,
            estimated_amount: None,
            notes: None,
            document_feedback: Vec::new(),
            ready_for_review: true,
            verified_at: chrono::Utc::now(),
        })
    }
}

/// Commits a rival approval just before the first terminal write it sees,
/// so that write deterministically loses the version race
struct RivalDecisionStore {
    inner: MockClaimStore,
    raced: AtomicBool,
}

impl RivalDecisionStore {
    fn new() -> Self {
        Self {
            inner: MockClaimStore::new(),
            raced: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl ClaimStore for RivalDecisionStore {
    async fn insert(&self, claim: &Claim) -> Result<(), StoreError> {
        self.inner.insert(claim).await
    }

    async fn get(&self, id: ClaimId) -> Result<Option<Claim>, StoreError> {
        self.inner.get(id).await
    }

    async fn update(&self, claim: &Claim, expected_version: i64) -> Result<Claim, StoreError> {
        if claim.status.is_terminal() && !self.raced.swap(true, Ordering::SeqCst) {
            let mut rival = self
                .inner
                .get(claim.id)
                .await?
                .ok_or_else(|| StoreError::not_found("Claim", claim.id))?;
            let version = rival.version;
            rival
                .decide(Decision::Approved, None, UserId::new())
                .expect("rival decision applies");
            self.inner.update(&rival, version).await?;
        }
        self.inner.update(claim, expected_version).await
    }

    async fn upsert_document(
        &self,
        id: ClaimId,
        document: UploadedDocument,
    ) -> Result<Claim, StoreError> {
        self.inner.upsert_document(id, document).await
    }

    async fn list_for_hospital(&self, hospital_id: HospitalId) -> Result<Vec<Claim>, StoreError> {
        self.inner.list_for_hospital(hospital_id).await
    }

    async fn list_for_policies(
        &self,
        policy_ids: &[PolicyId],
        status: Option<ClaimStatus>,
    ) -> Result<Vec<Claim>, StoreError> {
        self.inner.list_for_policies(policy_ids, status).await
    }

    async fn delete(&self, id: ClaimId) -> Result<(), StoreError> {
        self.inner.delete(id).await
    }
}

fn hospital_token(hospital: HospitalId) -> String {
    create_token(
        UserId::new(),
        "hospital_admin",
        Some(hospital.into()),
        SECRET,
        3600,
    )
    .expect("token")
}

fn insurer_token(company: CompanyId) -> String {
    create_token(
        UserId::new(),
        "insurance_admin",
        Some(company.into()),
        SECRET,
        3600,
    )
    .expect("token")
}

fn platform_token() -> String {
    create_token(UserId::new(), "platform_admin", None, SECRET, 3600).expect("token")
}

/// Seeds an active insurer policy connected to the given hospital
async fn seed_policy(h: &Harness, company: CompanyId, hospital: HospitalId) -> Policy {
    let policy = TestPolicyBuilder::new()
        .connected_to(hospital)
        .build_insurer(company);
    h.policies.insert(&policy).await.expect("seed policy");
    policy
}

fn claim_body(policy_id: Option<Uuid>) -> Value {
    match policy_id {
        Some(policy_id) => json!({
            "patient_name": "Asha Rao",
            "age": 41,
            "diagnosis": "Acute appendicitis",
            "treatment_plan": "Laparoscopic appendectomy",
            "policy_type": "CASHLESS",
            "policy_id": policy_id,
        }),
        None => json!({
            "patient_name": "Ben Okafor",
            "age": 29,
            "diagnosis": "Distal radius fracture",
            "treatment_plan": "Closed reduction and cast",
            "policy_type": "REIMBURSEMENT",
        }),
    }
}

async fn upload(h: &Harness, token: &str, claim_id: &str, name: &str) -> axum_test::TestResponse {
    h.server
        .post(&format!("/api/v1/claims/{claim_id}/documents"))
        .authorization_bearer(token)
        .json(&json!({
            "document_name": name,
            "storage_reference": format!("uploads/{name}"),
        }))
        .await
}

// ==== Authentication ====

#[tokio::test]
async fn requests_without_a_token_are_unauthorized() {
    let h = harness();
    let response = h.server.get("/api/v1/claims").await;
    assert_eq!(response.status_code(), 401);

    // Health stays public
    let response = h.server.get("/health").await;
    assert_eq!(response.status_code(), 200);
}

// ==== Claim lifecycle ====

#[tokio::test]
async fn reimbursement_claim_without_policy_is_created() {
    let h = harness();
    let token = hospital_token(HospitalId::new());

    let response = h
        .server
        .post("/api/v1/claims")
        .authorization_bearer(&token)
        .json(&claim_body(None))
        .await;
    assert_eq!(response.status_code(), 201);
    let body: Value = response.json();
    assert_eq!(body["status"], "DRAFT");
    assert_eq!(body["missing_documents"], json!([]));
    assert_eq!(body["policy"], Value::Null);
}

#[tokio::test]
async fn cashless_claim_requires_a_usable_policy() {
    let h = harness();
    let token = hospital_token(HospitalId::new());

    // Unknown policy reference
    let response = h
        .server
        .post("/api/v1/claims")
        .authorization_bearer(&token)
        .json(&claim_body(Some(Uuid::new_v4())))
        .await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"], "POLICY_NOT_USABLE");
}

#[tokio::test]
async fn missing_mandatory_document_blocks_review_until_uploaded() {
    let h = harness();
    let hospital = HospitalId::new();
    let company = CompanyId::new();
    let policy = seed_policy(&h, company, hospital).await;
    let token = hospital_token(hospital);

    let response = h
        .server
        .post("/api/v1/claims")
        .authorization_bearer(&token)
        .json(&claim_body(Some(policy.id.into())))
        .await;
    assert_eq!(response.status_code(), 201);
    let body: Value = response.json();
    // The resolved policy rides along with the checklist
    assert_eq!(body["policy"]["id"], json!(Uuid::from(policy.id)));
    assert_eq!(body["policy"]["status"], "ACTIVE");
    let claim_id = body["id"].as_str().expect("claim id").to_string();

    // Two of three mandatory documents
    upload(&h, &token, &claim_id, "Discharge Summary").await;
    upload(&h, &token, &claim_id, "Final Bill").await;

    // A verification pass alone does not open the review gate
    let response = h
        .server
        .post(&format!("/api/v1/claims/{claim_id}/verify"))
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.status_code(), 200);

    let response = h
        .server
        .post(&format!("/api/v1/claims/{claim_id}/submit-review"))
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["error"], "MISSING_MANDATORY_DOCUMENTS");
    assert!(body["detail"]
        .as_str()
        .expect("detail")
        .contains("Diagnosis Report"));

    // Uploading the named document clears the refusal
    upload(&h, &token, &claim_id, "diagnosis report").await;
    let response = h
        .server
        .post(&format!("/api/v1/claims/{claim_id}/submit-review"))
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json::<Value>()["status"], "REVIEW_READY");
}

#[tokio::test]
async fn insurer_decides_once_and_only_once() {
    let h = harness();
    let hospital = HospitalId::new();
    let company = CompanyId::new();
    let policy = seed_policy(&h, company, hospital).await;
    let hosp_token = hospital_token(hospital);

    let response = h
        .server
        .post("/api/v1/claims")
        .authorization_bearer(&hosp_token)
        .json(&claim_body(Some(policy.id.into())))
        .await;
    let claim_id = response.json::<Value>()["id"]
        .as_str()
        .expect("claim id")
        .to_string();

    for name in ["Discharge Summary", "Final Bill", "Diagnosis Report"] {
        upload(&h, &hosp_token, &claim_id, name).await;
    }
    h.server
        .post(&format!("/api/v1/claims/{claim_id}/verify"))
        .authorization_bearer(&hosp_token)
        .await;
    h.server
        .post(&format!("/api/v1/claims/{claim_id}/submit-review"))
        .authorization_bearer(&hosp_token)
        .await;

    // Draft-stage gating is over; the owning insurer decides
    let ins_token = insurer_token(company);
    let response = h
        .server
        .post(&format!("/api/v1/claims/{claim_id}/decision"))
        .authorization_bearer(&ins_token)
        .json(&json!({ "decision": "APPROVED" }))
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json::<Value>()["status"], "APPROVED");

    // The second decision hits the terminal guard
    let response = h
        .server
        .post(&format!("/api/v1/claims/{claim_id}/decision"))
        .authorization_bearer(&ins_token)
        .json(&json!({ "decision": "REJECTED", "reason": "duplicate" }))
        .await;
    assert_eq!(response.status_code(), 409);
    assert_eq!(response.json::<Value>()["error"], "ALREADY_DECIDED");

    // And the decided claim refuses deletion
    let response = h
        .server
        .delete(&format!("/api/v1/claims/{claim_id}"))
        .authorization_bearer(&hosp_token)
        .await;
    assert_eq!(response.status_code(), 409);
    assert_eq!(
        response.json::<Value>()["error"],
        "TERMINAL_CLAIM_IMMUTABLE"
    );
}

#[tokio::test]
async fn decision_race_loser_is_told_already_decided() {
    let h = harness_with(
        Arc::new(RivalDecisionStore::new()),
        Arc::new(StaticVerifier::passing()),
    );
    let hospital = HospitalId::new();
    let company = CompanyId::new();
    let policy = seed_policy(&h, company, hospital).await;
    let hosp_token = hospital_token(hospital);

    let response = h
        .server
        .post("/api/v1/claims")
        .authorization_bearer(&hosp_token)
        .json(&claim_body(Some(policy.id.into())))
        .await;
    let claim_id = response.json::<Value>()["id"]
        .as_str()
        .expect("claim id")
        .to_string();
    for name in ["Discharge Summary", "Final Bill", "Diagnosis Report"] {
        upload(&h, &hosp_token, &claim_id, name).await;
    }
    h.server
        .post(&format!("/api/v1/claims/{claim_id}/verify"))
        .authorization_bearer(&hosp_token)
        .await;
    h.server
        .post(&format!("/api/v1/claims/{claim_id}/submit-review"))
        .authorization_bearer(&hosp_token)
        .await;

    // A rival approval commits between this request's read and its write.
    // The loser is told the claim is decided, not just that a write raced.
    let ins_token = insurer_token(company);
    let response = h
        .server
        .post(&format!("/api/v1/claims/{claim_id}/decision"))
        .authorization_bearer(&ins_token)
        .json(&json!({ "decision": "REJECTED", "reason": "suspected duplicate" }))
        .await;
    assert_eq!(response.status_code(), 409);
    assert_eq!(response.json::<Value>()["error"], "ALREADY_DECIDED");

    // The rival's decision is what persisted
    let response = h
        .server
        .get(&format!("/api/v1/claims/{claim_id}"))
        .authorization_bearer(&ins_token)
        .await;
    assert_eq!(response.json::<Value>()["status"], "APPROVED");
}

#[tokio::test]
async fn rejection_with_blank_reason_is_refused_and_state_unchanged() {
    let h = harness();
    let hospital = HospitalId::new();
    let company = CompanyId::new();
    let policy = seed_policy(&h, company, hospital).await;
    let hosp_token = hospital_token(hospital);

    let response = h
        .server
        .post("/api/v1/claims")
        .authorization_bearer(&hosp_token)
        .json(&claim_body(Some(policy.id.into())))
        .await;
    let claim_id = response.json::<Value>()["id"]
        .as_str()
        .expect("claim id")
        .to_string();
    for name in ["Discharge Summary", "Final Bill", "Diagnosis Report"] {
        upload(&h, &hosp_token, &claim_id, name).await;
    }
    h.server
        .post(&format!("/api/v1/claims/{claim_id}/verify"))
        .authorization_bearer(&hosp_token)
        .await;
    h.server
        .post(&format!("/api/v1/claims/{claim_id}/submit-review"))
        .authorization_bearer(&hosp_token)
        .await;

    let ins_token = insurer_token(company);
    let response = h
        .server
        .post(&format!("/api/v1/claims/{claim_id}/decision"))
        .authorization_bearer(&ins_token)
        .json(&json!({ "decision": "REJECTED", "reason": "   " }))
        .await;
    assert_eq!(response.status_code(), 400);
    assert_eq!(
        response.json::<Value>()["error"],
        "REJECTION_REASON_REQUIRED"
    );

    // Still awaiting a decision
    let response = h
        .server
        .get(&format!("/api/v1/claims/{claim_id}"))
        .authorization_bearer(&ins_token)
        .await;
    assert_eq!(response.json::<Value>()["status"], "REVIEW_READY");
}

// ==== Tenancy ====

#[tokio::test]
async fn cross_tenant_access_renders_as_not_found() {
    let h = harness();
    let hospital = HospitalId::new();
    let company = CompanyId::new();
    let policy = seed_policy(&h, company, hospital).await;
    let hosp_token = hospital_token(hospital);

    let response = h
        .server
        .post("/api/v1/claims")
        .authorization_bearer(&hosp_token)
        .json(&claim_body(Some(policy.id.into())))
        .await;
    let claim_id = response.json::<Value>()["id"]
        .as_str()
        .expect("claim id")
        .to_string();

    // Another hospital never learns the claim exists
    let other_hospital = hospital_token(HospitalId::new());
    let response = h
        .server
        .get(&format!("/api/v1/claims/{claim_id}"))
        .authorization_bearer(&other_hospital)
        .await;
    assert_eq!(response.status_code(), 404);

    // Nor does an insurer whose policies the claim does not reference
    let other_insurer = insurer_token(CompanyId::new());
    let response = h
        .server
        .post(&format!("/api/v1/claims/{claim_id}/decision"))
        .authorization_bearer(&other_insurer)
        .json(&json!({ "decision": "APPROVED" }))
        .await;
    assert_eq!(response.status_code(), 404);

    // Even the linked insurer sees nothing while the claim is in draft
    let linked_insurer = insurer_token(company);
    let response = h
        .server
        .get(&format!("/api/v1/claims/{claim_id}"))
        .authorization_bearer(&linked_insurer)
        .await;
    assert_eq!(response.status_code(), 404);
}

// ==== Verification ====

#[tokio::test]
async fn failed_verification_surfaces_502_and_returns_claim_to_draft() {
    let h = harness_with_verifier(Arc::new(FailingVerifier));
    let hospital = HospitalId::new();
    let token = hospital_token(hospital);

    let response = h
        .server
        .post("/api/v1/claims")
        .authorization_bearer(&token)
        .json(&claim_body(None))
        .await;
    let claim_id = response.json::<Value>()["id"]
        .as_str()
        .expect("claim id")
        .to_string();
    upload(&h, &token, &claim_id, "Discharge Summary").await;

    let response = h
        .server
        .post(&format!("/api/v1/claims/{claim_id}/verify"))
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.status_code(), 502);
    assert_eq!(response.json::<Value>()["error"], "UPSTREAM_UNAVAILABLE");

    let response = h
        .server
        .get(&format!("/api/v1/claims/{claim_id}"))
        .authorization_bearer(&token)
        .await;
    let body: Value = response.json();
    assert_eq!(body["status"], "DRAFT");
    assert_eq!(body["verification"], Value::Null);
}

#[tokio::test]
async fn abandoned_verification_request_still_resolves_server_side() {
    let h = harness_with_verifier(Arc::new(SlowVerifier {
        delay: Duration::from_millis(200),
    }));
    let token = hospital_token(HospitalId::new());

    let response = h
        .server
        .post("/api/v1/claims")
        .authorization_bearer(&token)
        .json(&claim_body(None))
        .await;
    let claim_id = response.json::<Value>()["id"]
        .as_str()
        .expect("claim id")
        .to_string();
    upload(&h, &token, &claim_id, "Discharge Summary").await;

    // Drop the request mid-call, as a disconnecting client would
    let request = async {
        h.server
            .post(&format!("/api/v1/claims/{claim_id}/verify"))
            .authorization_bearer(&token)
            .await
    };
    tokio::select! {
        _ = request => panic!("verifier should still be running"),
        _ = tokio::time::sleep(Duration::from_millis(50)) => {}
    }

    // The run finishes on its own; the claim must not stay stuck in
    // AWAITING_VERIFICATION
    tokio::time::sleep(Duration::from_millis(400)).await;
    let response = h
        .server
        .get(&format!("/api/v1/claims/{claim_id}"))
        .authorization_bearer(&token)
        .await;
    let body: Value = response.json();
    assert_eq!(body["status"], "DRAFT");
    assert!(body["verification"].is_object());

    // And a fresh verify request is accepted
    let response = h
        .server
        .post(&format!("/api/v1/claims/{claim_id}/verify"))
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn verification_requires_at_least_one_document() {
    let h = harness();
    let token = hospital_token(HospitalId::new());

    let response = h
        .server
        .post("/api/v1/claims")
        .authorization_bearer(&token)
        .json(&claim_body(None))
        .await;
    let claim_id = response.json::<Value>()["id"]
        .as_str()
        .expect("claim id")
        .to_string();

    let response = h
        .server
        .post(&format!("/api/v1/claims/{claim_id}/verify"))
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.status_code(), 400);
    assert_eq!(response.json::<Value>()["error"], "NO_DOCUMENTS_UPLOADED");
}

// ==== Policies ====

#[tokio::test]
async fn hospital_drafts_policy_from_analyzer_and_finalizes() {
    let h = harness();
    let hospital = HospitalId::new();
    let token = hospital_token(hospital);

    let response = h
        .server
        .post("/api/v1/policies/drafts")
        .authorization_bearer(&token)
        .json(&json!({
            "name": "Internal Surgery Cover",
            "source_document": "uploads/policy.pdf",
        }))
        .await;
    assert_eq!(response.status_code(), 201);
    let body: Value = response.json();
    assert_eq!(body["status"], "DRAFT");
    let suggested = body["required_documents"].as_array().expect("checklist");
    assert_eq!(suggested.len(), 3);
    let policy_id = body["id"].as_str().expect("policy id").to_string();

    // Owner trims the checklist and confirms
    let response = h
        .server
        .post(&format!("/api/v1/policies/{policy_id}/finalize"))
        .authorization_bearer(&token)
        .json(&json!({
            "required_documents": [
                { "name": "Discharge Summary", "description": "Stay summary", "notes": null, "mandatory": true }
            ]
        }))
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json::<Value>()["status"], "ACTIVE");

    // A second finalize conflicts
    let response = h
        .server
        .post(&format!("/api/v1/policies/{policy_id}/finalize"))
        .authorization_bearer(&token)
        .json(&json!({ "required_documents": [] }))
        .await;
    assert_eq!(response.status_code(), 409);
}

#[tokio::test]
async fn connected_hospital_sees_insurer_policy_but_cannot_edit() {
    let h = harness();
    let hospital = HospitalId::new();
    let company = CompanyId::new();
    let policy = seed_policy(&h, company, hospital).await;

    let token = hospital_token(hospital);
    let response = h
        .server
        .get(&format!("/api/v1/policies/{}", Uuid::from(policy.id)))
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.status_code(), 200);

    let response = h
        .server
        .put(&format!(
            "/api/v1/policies/{}/requirements",
            Uuid::from(policy.id)
        ))
        .authorization_bearer(&token)
        .json(&json!({ "required_documents": [] }))
        .await;
    assert_eq!(response.status_code(), 403);
}

// ==== Registry ====

#[tokio::test]
async fn platform_admin_bootstraps_organizations() {
    let h = harness();
    let token = platform_token();

    let response = h
        .server
        .post("/api/v1/registry/hospitals")
        .authorization_bearer(&token)
        .json(&json!({
            "name": "Lakeside General",
            "address": "12 Shore Road",
            "contact_info": "042-555-0101",
            "admin_username": "lakeside-admin",
            "admin_display_name": "Lakeside Admin",
            "admin_password_hash": "$argon2id$stub",
        }))
        .await;
    assert_eq!(response.status_code(), 201);

    let response = h
        .server
        .get("/api/v1/registry/hospitals")
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.json::<Value>().as_array().expect("list").len(), 1);

    // Org-scoped roles have no registry authority
    let response = h
        .server
        .get("/api/v1/registry/hospitals")
        .authorization_bearer(&hospital_token(HospitalId::new()))
        .await;
    assert_eq!(response.status_code(), 403);
}
