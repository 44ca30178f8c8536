//! Registry DTOs
//!
//! Organization creation bootstraps the org together with its admin account.
//! Password hashing is the identity collaborator's job; requests carry the
//! finished hash, never a plaintext password.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use domain_party::{Hospital, InsuranceCompany};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateHospitalRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    pub address: String,
    pub contact_info: String,
    #[validate(length(min = 3, message = "admin_username too short"))]
    pub admin_username: String,
    #[validate(length(min = 1, message = "admin_display_name must not be empty"))]
    pub admin_display_name: String,
    pub admin_password_hash: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCompanyRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    pub contact_info: String,
    #[validate(length(min = 3, message = "admin_username too short"))]
    pub admin_username: String,
    #[validate(length(min = 1, message = "admin_display_name must not be empty"))]
    pub admin_display_name: String,
    pub admin_password_hash: String,
}

#[derive(Debug, Serialize)]
pub struct HospitalResponse {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub contact_info: String,
    pub admin_user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<&Hospital> for HospitalResponse {
    fn from(hospital: &Hospital) -> Self {
        Self {
            id: hospital.id.into(),
            name: hospital.name.clone(),
            address: hospital.address.clone(),
            contact_info: hospital.contact_info.clone(),
            admin_user_id: hospital.admin_user_id.into(),
            created_at: hospital.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CompanyResponse {
    pub id: Uuid,
    pub name: String,
    pub contact_info: String,
    pub admin_user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<&InsuranceCompany> for CompanyResponse {
    fn from(company: &InsuranceCompany) -> Self {
        Self {
            id: company.id.into(),
            name: company.name.clone(),
            contact_info: company.contact_info.clone(),
            admin_user_id: company.admin_user_id.into(),
            created_at: company.created_at,
        }
    }
}
