//! Request-scoped actor context
//!
//! Resolved once by the auth middleware from a verified bearer credential
//! and passed into every gate check; never trusted as client-supplied state.

use serde::{Deserialize, Serialize};

use core_kernel::{CompanyId, HospitalId, UserId};
use domain_party::UserRole;

/// The verified identity and scope behind a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub role: UserRole,
    /// Set iff role is HospitalAdmin
    pub hospital_id: Option<HospitalId>,
    /// Set iff role is InsuranceAdmin
    pub company_id: Option<CompanyId>,
}

impl Actor {
    pub fn platform_admin(user_id: UserId) -> Self {
        Self {
            user_id,
            role: UserRole::PlatformAdmin,
            hospital_id: None,
            company_id: None,
        }
    }

    pub fn hospital_admin(user_id: UserId, hospital_id: HospitalId) -> Self {
        Self {
            user_id,
            role: UserRole::HospitalAdmin,
            hospital_id: Some(hospital_id),
            company_id: None,
        }
    }

    pub fn insurance_admin(user_id: UserId, company_id: CompanyId) -> Self {
        Self {
            user_id,
            role: UserRole::InsuranceAdmin,
            hospital_id: None,
            company_id: Some(company_id),
        }
    }
}
