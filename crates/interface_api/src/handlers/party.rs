//! Registry handlers
//!
//! Platform-admin only: hospitals and insurance companies are created with
//! their bootstrap admin accounts in one step.

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{CompanyId, HospitalId};
use domain_access::{require_platform_admin, Actor};
use domain_party::{Hospital, InsuranceCompany, UserAccount};

use crate::dto::party::*;
use crate::{error::ApiError, AppState};

/// Creates a hospital together with its admin account
pub async fn create_hospital(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreateHospitalRequest>,
) -> Result<(StatusCode, Json<HospitalResponse>), ApiError> {
    require_platform_admin(&actor)?;
    request.validate()?;

    // Account and org reference each other; the scope is fixed up once the
    // org id exists
    let mut admin = UserAccount::hospital_admin(
        request.admin_username,
        request.admin_display_name,
        request.admin_password_hash,
        HospitalId::new_v7(),
    );
    let hospital = Hospital::new(request.name, request.address, request.contact_info, admin.id);
    admin.hospital_id = Some(hospital.id);

    state.parties.create_hospital(&hospital, &admin).await?;

    tracing::info!(hospital_id = %hospital.id, actor = %actor.user_id, "Hospital registered");
    Ok((StatusCode::CREATED, Json(HospitalResponse::from(&hospital))))
}

/// Creates an insurance company together with its admin account
pub async fn create_company(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<CreateCompanyRequest>,
) -> Result<(StatusCode, Json<CompanyResponse>), ApiError> {
    require_platform_admin(&actor)?;
    request.validate()?;

    let mut admin = UserAccount::insurance_admin(
        request.admin_username,
        request.admin_display_name,
        request.admin_password_hash,
        CompanyId::new_v7(),
    );
    let company = InsuranceCompany::new(request.name, request.contact_info, admin.id);
    admin.company_id = Some(company.id);

    state.parties.create_company(&company, &admin).await?;

    tracing::info!(company_id = %company.id, actor = %actor.user_id, "Insurance company registered");
    Ok((StatusCode::CREATED, Json(CompanyResponse::from(&company))))
}

/// Lists registered hospitals
pub async fn list_hospitals(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<HospitalResponse>>, ApiError> {
    require_platform_admin(&actor)?;
    let hospitals = state.parties.list_hospitals().await?;
    Ok(Json(hospitals.iter().map(HospitalResponse::from).collect()))
}

/// Lists registered insurance companies
pub async fn list_companies(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<CompanyResponse>>, ApiError> {
    require_platform_admin(&actor)?;
    let companies = state.parties.list_companies().await?;
    Ok(Json(companies.iter().map(CompanyResponse::from).collect()))
}

/// Gets a hospital
pub async fn get_hospital(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<HospitalResponse>, ApiError> {
    require_platform_admin(&actor)?;
    let hospital = state
        .parties
        .get_hospital(HospitalId::from(id))
        .await?
        .ok_or_else(|| ApiError::NotFound("hospital not found".to_string()))?;
    Ok(Json(HospitalResponse::from(&hospital)))
}

/// Gets an insurance company
pub async fn get_company(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<Json<CompanyResponse>, ApiError> {
    require_platform_admin(&actor)?;
    let company = state
        .parties
        .get_company(CompanyId::from(id))
        .await?
        .ok_or_else(|| ApiError::NotFound("insurance company not found".to_string()))?;
    Ok(Json(CompanyResponse::from(&company)))
}

/// Removes a hospital from the registry
pub async fn delete_hospital(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require_platform_admin(&actor)?;
    state.parties.delete_hospital(HospitalId::from(id)).await?;
    tracing::info!(hospital_id = %id, actor = %actor.user_id, "Hospital removed");
    Ok(StatusCode::NO_CONTENT)
}

/// Removes an insurance company from the registry
pub async fn delete_company(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require_platform_admin(&actor)?;
    state.parties.delete_company(CompanyId::from(id)).await?;
    tracing::info!(company_id = %id, actor = %actor.user_id, "Insurance company removed");
    Ok(StatusCode::NO_CONTENT)
}
