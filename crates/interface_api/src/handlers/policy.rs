//! Policy handlers

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{HospitalId, PolicyId};
use domain_access::{authorize_policy, Actor, PolicyAction};
use domain_party::UserRole;
use domain_policy::Policy;

use crate::dto::policy::*;
use crate::{error::ApiError, AppState};

async fn load_policy(state: &AppState, id: Uuid) -> Result<Policy, ApiError> {
    state
        .policies
        .get(PolicyId::from(id))
        .await?
        .ok_or_else(|| ApiError::NotFound("policy not found".to_string()))
}

/// Creates an insurer-owned policy with a confirmed checklist; it is active
/// immediately
pub async fn create_policy(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreatePolicyRequest>,
) -> Result<(StatusCode, Json<PolicyResponse>), ApiError> {
    let company_id = match (actor.role, actor.company_id) {
        (UserRole::InsuranceAdmin, Some(company_id)) => company_id,
        _ => {
            return Err(ApiError::Forbidden(
                "only insurance users create insurer policies".to_string(),
            ))
        }
    };
    request.validate()?;

    let policy = Policy::active(
        request.name,
        company_id,
        request.required_documents,
        request.coverage_notes,
    )?;
    state.policies.insert(&policy).await?;

    tracing::info!(policy_id = %policy.id, company_id = %company_id, "Policy created");
    Ok((StatusCode::CREATED, Json(PolicyResponse::from(&policy))))
}

/// Creates a hospital-owned draft policy. The checklist is seeded by the
/// external analyzer from the referenced policy document and stays editable
/// until the owner finalizes it.
pub async fn create_draft_policy(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreateDraftPolicyRequest>,
) -> Result<(StatusCode, Json<PolicyResponse>), ApiError> {
    let hospital_id = match (actor.role, actor.hospital_id) {
        (UserRole::HospitalAdmin, Some(hospital_id)) => hospital_id,
        _ => {
            return Err(ApiError::Forbidden(
                "only hospital users create draft policies".to_string(),
            ))
        }
    };
    request.validate()?;

    let suggested = state
        .analyzer
        .suggest_checklist(&request.source_document)
        .await?;
    let policy = Policy::draft(
        request.name,
        hospital_id,
        suggested,
        Some(request.source_document),
    )?;
    state.policies.insert(&policy).await?;

    tracing::info!(policy_id = %policy.id, hospital_id = %hospital_id, "Draft policy created");
    Ok((StatusCode::CREATED, Json(PolicyResponse::from(&policy))))
}

/// Lists policies visible to the actor
pub async fn list_policies(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<PolicyResponse>>, ApiError> {
    let policies = match actor.role {
        UserRole::HospitalAdmin => {
            let hospital_id = actor.hospital_id.ok_or_else(|| {
                ApiError::Forbidden("hospital role without a hospital scope".to_string())
            })?;
            state.policies.list_for_hospital(hospital_id).await?
        }
        UserRole::InsuranceAdmin => {
            let company_id = actor.company_id.ok_or_else(|| {
                ApiError::Forbidden("insurance role without a company scope".to_string())
            })?;
            state.policies.list_for_company(company_id).await?
        }
        UserRole::PlatformAdmin => {
            return Err(ApiError::Forbidden(
                "platform administrators have no policy authority".to_string(),
            ))
        }
    };
    Ok(Json(policies.iter().map(PolicyResponse::from).collect()))
}

/// Gets a policy
pub async fn get_policy(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<PolicyResponse>, ApiError> {
    let policy = load_policy(&state, id).await?;
    authorize_policy(&actor, &policy, PolicyAction::View)?;
    Ok(Json(PolicyResponse::from(&policy)))
}

/// Replaces the draft checklist
pub async fn update_requirements(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRequirementsRequest>,
) -> Result<Json<PolicyResponse>, ApiError> {
    let mut policy = load_policy(&state, id).await?;
    authorize_policy(&actor, &policy, PolicyAction::EditChecklist)?;

    policy.set_requirements(request.required_documents)?;
    state.policies.update(&policy).await?;
    Ok(Json(PolicyResponse::from(&policy)))
}

/// Confirms the checklist and activates the policy
pub async fn finalize_policy(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(request): Json<FinalizePolicyRequest>,
) -> Result<Json<PolicyResponse>, ApiError> {
    let mut policy = load_policy(&state, id).await?;
    authorize_policy(&actor, &policy, PolicyAction::Finalize)?;

    policy.finalize(request.required_documents)?;
    state.policies.update(&policy).await?;

    tracing::info!(policy_id = %policy.id, "Policy finalized");
    Ok(Json(PolicyResponse::from(&policy)))
}

/// Replaces the set of hospitals connected to an insurer policy
pub async fn connect_hospitals(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(request): Json<ConnectHospitalsRequest>,
) -> Result<Json<PolicyResponse>, ApiError> {
    let mut policy = load_policy(&state, id).await?;
    authorize_policy(&actor, &policy, PolicyAction::ConnectHospitals)?;

    let hospital_ids: Vec<HospitalId> = request
        .hospital_ids
        .into_iter()
        .map(HospitalId::from)
        .collect();
    policy.connect_hospitals(hospital_ids)?;
    state.policies.update(&policy).await?;

    tracing::info!(policy_id = %policy.id, "Policy hospital connections updated");
    Ok(Json(PolicyResponse::from(&policy)))
}
