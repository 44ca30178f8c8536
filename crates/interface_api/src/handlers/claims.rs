//! Claims handlers
//!
//! Orchestration per request: authorize against the gate, apply the
//! transition on the aggregate, persist through the compare-and-swap store.
//! A lost race surfaces as 409 VERSION_CONFLICT and the client re-reads and
//! retries, except on the decision endpoint, where a loser whose rival
//! already decided the claim is told ALREADY_DECIDED.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{ClaimId, PolicyId};
use domain_access::{authorize_claim, claim_owner_scope, Actor, ClaimAction};
use domain_claims::{reconcile, Claim, ClaimError, ClaimStatus, UploadedDocument};
use domain_party::UserRole;
use domain_policy::Policy;

use crate::dto::claims::*;
use crate::{error::ApiError, AppState};

async fn load_claim(state: &AppState, id: Uuid) -> Result<Claim, ApiError> {
    state
        .claims
        .get(ClaimId::from(id))
        .await?
        .ok_or_else(|| ApiError::NotFound("claim not found".to_string()))
}

/// Resolves the claim's referenced policy. A dangling reference degrades to
/// `None`: the claim keeps working as if no checklist applied, and insurer
/// access (which is derived from the policy) stays hidden.
async fn resolve_policy(state: &AppState, claim: &Claim) -> Result<Option<Policy>, ApiError> {
    match claim.policy_id {
        Some(policy_id) => Ok(state.policies.get(policy_id).await?),
        None => Ok(None),
    }
}

fn detail(claim: &Claim, policy: Option<&Policy>) -> ClaimDetailResponse {
    let requirements = policy.map(|p| p.required_documents.as_slice()).unwrap_or(&[]);
    let reconciliation = reconcile(requirements, &claim.documents);
    ClaimDetailResponse::new(claim, policy, &reconciliation)
}

/// Creates a draft claim owned by the acting hospital
pub async fn create_claim(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<ClaimProfileRequest>,
) -> Result<(StatusCode, Json<ClaimDetailResponse>), ApiError> {
    let hospital_id = claim_owner_scope(&actor)?;
    request.validate()?;
    let profile = request.into_profile();

    // A referenced policy must be active and usable by this hospital
    let policy = match profile.policy_id {
        Some(policy_id) => {
            let policy = state
                .policies
                .get(policy_id)
                .await?
                .filter(|p| p.usable_by(hospital_id))
                .ok_or_else(|| ApiError::Validation {
                    code: "POLICY_NOT_USABLE",
                    detail: "referenced policy is not active for this hospital".to_string(),
                })?;
            Some(policy)
        }
        None => None,
    };

    let claim = Claim::new(hospital_id, profile)?;
    state.claims.insert(&claim).await?;

    tracing::info!(claim_id = %claim.id, hospital_id = %hospital_id, "Claim created");
    Ok((StatusCode::CREATED, Json(detail(&claim, policy.as_ref()))))
}

/// Lists claims visible to the actor: a hospital sees its own, an insurer
/// sees claims on its policies once they have surfaced for review
pub async fn list_claims(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ListClaimsQuery>,
) -> Result<Json<Vec<ClaimResponse>>, ApiError> {
    let claims = match actor.role {
        UserRole::HospitalAdmin => {
            let hospital_id = claim_owner_scope(&actor)?;
            let mut claims = state.claims.list_for_hospital(hospital_id).await?;
            if let Some(status) = query.status {
                claims.retain(|c| c.status == status);
            }
            claims
        }
        UserRole::InsuranceAdmin => {
            let company_id = actor.company_id.ok_or_else(|| {
                ApiError::Forbidden("insurance role without a company scope".to_string())
            })?;
            let policies = state.policies.list_for_company(company_id).await?;
            let policy_ids: Vec<PolicyId> = policies.iter().map(|p| p.id).collect();
            let mut claims = state
                .claims
                .list_for_policies(&policy_ids, query.status)
                .await?;
            // Draft-stage claims never surface to the insurer
            claims.retain(|c| {
                !matches!(
                    c.status,
                    ClaimStatus::Draft | ClaimStatus::AwaitingVerification
                )
            });
            claims
        }
        UserRole::PlatformAdmin => {
            return Err(ApiError::Forbidden(
                "platform administrators have no claim authority".to_string(),
            ))
        }
    };
    Ok(Json(claims.iter().map(ClaimResponse::from).collect()))
}

/// Gets a claim with its requirement checklist and a fresh reconciliation
pub async fn get_claim(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClaimDetailResponse>, ApiError> {
    let claim = load_claim(&state, id).await?;
    let policy = resolve_policy(&state, &claim).await?;
    authorize_claim(&actor, &claim, policy.as_ref(), ClaimAction::View)?;
    Ok(Json(detail(&claim, policy.as_ref())))
}

/// Replaces the draft claim's profile fields
pub async fn update_claim(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(request): Json<ClaimProfileRequest>,
) -> Result<Json<ClaimDetailResponse>, ApiError> {
    let mut claim = load_claim(&state, id).await?;
    let policy = resolve_policy(&state, &claim).await?;
    authorize_claim(&actor, &claim, policy.as_ref(), ClaimAction::EditProfile)?;

    request.validate()?;
    let profile = request.into_profile();
    if let (Some(policy_id), Some(hospital_id)) = (profile.policy_id, actor.hospital_id) {
        state
            .policies
            .get(policy_id)
            .await?
            .filter(|p| p.usable_by(hospital_id))
            .ok_or_else(|| ApiError::Validation {
                code: "POLICY_NOT_USABLE",
                detail: "referenced policy is not active for this hospital".to_string(),
            })?;
    }

    let version = claim.version;
    claim.update_profile(profile)?;
    let persisted = state.claims.update(&claim, version).await?;

    let policy = resolve_policy(&state, &persisted).await?;
    Ok(Json(detail(&persisted, policy.as_ref())))
}

/// Registers an uploaded document. Re-uploading a name replaces the stored
/// reference; concurrent uploads of different names never lose data.
pub async fn upload_document(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(request): Json<UploadDocumentRequest>,
) -> Result<Json<ClaimDetailResponse>, ApiError> {
    let claim = load_claim(&state, id).await?;
    let policy = resolve_policy(&state, &claim).await?;
    authorize_claim(&actor, &claim, policy.as_ref(), ClaimAction::UploadDocument)?;

    request.validate()?;
    let document = UploadedDocument {
        document_name: request.document_name,
        storage_reference: request.storage_reference,
        uploaded_at: chrono::Utc::now(),
    };
    let persisted = state.claims.upsert_document(claim.id, document).await?;

    Ok(Json(detail(&persisted, policy.as_ref())))
}

/// Runs one verification pass against the external service.
///
/// The AWAITING_VERIFICATION marker is persisted first so the record is not
/// locked for the duration of the call. On success the report replaces the
/// previous one wholesale; on failure the claim returns to draft untouched
/// and the upstream failure surfaces as 502.
pub async fn request_verification(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClaimDetailResponse>, ApiError> {
    let mut claim = load_claim(&state, id).await?;
    let policy = resolve_policy(&state, &claim).await?;
    authorize_claim(&actor, &claim, policy.as_ref(), ClaimAction::RequestVerification)?;

    let version = claim.version;
    claim.begin_verification()?;
    let pending = state.claims.update(&claim, version).await?;

    // The call and the follow-up write run on a detached task: a client that
    // drops the request cannot strand the claim in AWAITING_VERIFICATION.
    // The adapter's timeout bounds how long the task lives.
    let task = tokio::spawn(run_verification(state, pending, policy));
    let (persisted, policy) = task
        .await
        .map_err(|err| ApiError::Internal(format!("verification task failed: {err}")))??;
    Ok(Json(detail(&persisted, policy.as_ref())))
}

async fn run_verification(
    state: AppState,
    pending: Claim,
    policy: Option<Policy>,
) -> Result<(Claim, Option<Policy>), ApiError> {
    let outcome = state.verifier.verify(&pending, policy.as_ref()).await;

    // Re-acquire: the call ran without the record held
    let mut fresh = state
        .claims
        .get(pending.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("claim not found".to_string()))?;
    let version = fresh.version;
    match outcome {
        Ok(report) => {
            tracing::info!(claim_id = %fresh.id, score = report.score, "Verification completed");
            fresh.complete_verification(report)?;
            let persisted = state.claims.update(&fresh, version).await?;
            Ok((persisted, policy))
        }
        Err(err) => {
            tracing::warn!(claim_id = %fresh.id, error = %err, "Verification failed");
            fresh.abort_verification()?;
            state.claims.update(&fresh, version).await?;
            Err(err.into())
        }
    }
}

/// Submits the claim for the insurer's review. The reconciliation is
/// computed fresh against the policy's current checklist; missing mandatory
/// documents are named in the refusal.
pub async fn submit_for_review(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClaimDetailResponse>, ApiError> {
    let mut claim = load_claim(&state, id).await?;
    let policy = resolve_policy(&state, &claim).await?;
    authorize_claim(&actor, &claim, policy.as_ref(), ClaimAction::SubmitForReview)?;

    let requirements = policy
        .as_ref()
        .map(|p| p.required_documents.as_slice())
        .unwrap_or(&[]);
    let reconciliation = reconcile(requirements, &claim.documents);

    let version = claim.version;
    claim.submit_for_review(&reconciliation)?;
    let persisted = state.claims.update(&claim, version).await?;

    tracing::info!(claim_id = %persisted.id, "Claim submitted for review");
    Ok(Json(detail(&persisted, policy.as_ref())))
}

/// Applies the insurer's terminal decision. Exactly one decision wins; the
/// loser of a concurrent race is told the claim is already decided.
pub async fn decide_claim(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(request): Json<DecisionRequest>,
) -> Result<Json<ClaimDetailResponse>, ApiError> {
    let mut claim = load_claim(&state, id).await?;
    let policy = resolve_policy(&state, &claim).await?;
    authorize_claim(&actor, &claim, policy.as_ref(), ClaimAction::Decide)?;

    let version = claim.version;
    claim.decide(request.decision, request.reason, actor.user_id)?;
    let persisted = match state.claims.update(&claim, version).await {
        Ok(persisted) => persisted,
        Err(err) if err.is_version_conflict() => {
            // The rival write may itself have been the decision; re-read so
            // the loser sees the terminal state rather than a bare race.
            let current = load_claim(&state, id).await?;
            if current.status.is_terminal() {
                return Err(ClaimError::AlreadyDecided {
                    status: current.status,
                }
                .into());
            }
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!(
        claim_id = %persisted.id,
        decision = ?request.decision,
        decided_by = %actor.user_id,
        "Claim decided"
    );
    Ok(Json(detail(&persisted, policy.as_ref())))
}

/// Deletes an undecided claim. Decided claims are immutable; the refusal is
/// explicit and audited.
pub async fn delete_claim(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let claim = load_claim(&state, id).await?;
    let policy = resolve_policy(&state, &claim).await?;
    authorize_claim(&actor, &claim, policy.as_ref(), ClaimAction::Delete)?;

    if let Err(err) = claim.ensure_deletable() {
        tracing::warn!(claim_id = %claim.id, actor = %actor.user_id, "Refused deletion of decided claim");
        return Err(err.into());
    }
    state.claims.delete(claim.id).await?;

    tracing::info!(claim_id = %claim.id, actor = %actor.user_id, "Claim deleted");
    Ok(StatusCode::NO_CONTENT)
}
