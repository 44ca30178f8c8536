//! User accounts and roles
//!
//! The platform recognizes exactly three roles. Role plus organization scope
//! is the whole authorization input; there is no per-user permission list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{CompanyId, HospitalId, UserId};

use crate::error::PartyError;

/// Actor role, resolved once from the bearer credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Manages the hospital/insurer registry and bootstrap accounts only
    PlatformAdmin,
    /// Scoped to claims and policies owned by their hospital
    HospitalAdmin,
    /// Scoped to claims whose resolved policy belongs to their company
    InsuranceAdmin,
}

/// A user account
///
/// Accounts are created as part of organization bootstrap; a hospital admin
/// always carries a `hospital_id`, an insurance admin a `company_id`, and the
/// platform admin neither.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub username: String,
    pub email: Option<String>,
    pub display_name: String,
    pub role: UserRole,
    /// Hospital scope, set iff role is HospitalAdmin
    pub hospital_id: Option<HospitalId>,
    /// Company scope, set iff role is InsuranceAdmin
    pub company_id: Option<CompanyId>,
    /// Password hash produced by the external auth collaborator
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    /// Creates an unscoped platform admin account
    pub fn platform_admin(
        username: impl Into<String>,
        display_name: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: UserId::new_v7(),
            username: username.into(),
            email: None,
            display_name: display_name.into(),
            role: UserRole::PlatformAdmin,
            hospital_id: None,
            company_id: None,
            password_hash: password_hash.into(),
            created_at: Utc::now(),
        }
    }

    /// Creates a hospital admin account scoped to the given hospital
    pub fn hospital_admin(
        username: impl Into<String>,
        display_name: impl Into<String>,
        password_hash: impl Into<String>,
        hospital_id: HospitalId,
    ) -> Self {
        Self {
            id: UserId::new_v7(),
            username: username.into(),
            email: None,
            display_name: display_name.into(),
            role: UserRole::HospitalAdmin,
            hospital_id: Some(hospital_id),
            company_id: None,
            password_hash: password_hash.into(),
            created_at: Utc::now(),
        }
    }

    /// Creates an insurance admin account scoped to the given company
    pub fn insurance_admin(
        username: impl Into<String>,
        display_name: impl Into<String>,
        password_hash: impl Into<String>,
        company_id: CompanyId,
    ) -> Self {
        Self {
            id: UserId::new_v7(),
            username: username.into(),
            email: None,
            display_name: display_name.into(),
            role: UserRole::InsuranceAdmin,
            hospital_id: None,
            company_id: Some(company_id),
            password_hash: password_hash.into(),
            created_at: Utc::now(),
        }
    }

    /// Checks that the scope fields are consistent with the role
    pub fn validate_scope(&self) -> Result<(), PartyError> {
        match self.role {
            UserRole::HospitalAdmin if self.hospital_id.is_none() => Err(
                PartyError::InvalidAccountScope("hospital admin requires a hospital_id".into()),
            ),
            UserRole::InsuranceAdmin if self.company_id.is_none() => Err(
                PartyError::InvalidAccountScope("insurance admin requires a company_id".into()),
            ),
            UserRole::PlatformAdmin if self.hospital_id.is_some() || self.company_id.is_some() => {
                Err(PartyError::InvalidAccountScope(
                    "platform admin must not carry an organization scope".into(),
                ))
            }
            _ => Ok(()),
        }
    }
}
