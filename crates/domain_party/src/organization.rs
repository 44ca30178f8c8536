//! Hospital and insurance company registry entities
//!
//! Both organization kinds are created by the platform admin together with a
//! bootstrap admin account. The admin account is the only user with
//! org-scoped rights until the organization provisions more.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{CompanyId, HospitalId, UserId};

/// A hospital registered on the platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hospital {
    /// Unique identifier
    pub id: HospitalId,
    /// Display name
    pub name: String,
    /// Postal address
    pub address: String,
    /// Contact details (phone/email, free text)
    pub contact_info: String,
    /// Bootstrap admin account for this hospital
    pub admin_user_id: UserId,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Hospital {
    /// Creates a new hospital record
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        contact_info: impl Into<String>,
        admin_user_id: UserId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: HospitalId::new_v7(),
            name: name.into(),
            address: address.into(),
            contact_info: contact_info.into(),
            admin_user_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// An insurance company registered on the platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsuranceCompany {
    /// Unique identifier
    pub id: CompanyId,
    /// Display name
    pub name: String,
    /// Contact details (phone/email, free text)
    pub contact_info: String,
    /// Bootstrap admin account for this company
    pub admin_user_id: UserId,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl InsuranceCompany {
    /// Creates a new insurance company record
    pub fn new(
        name: impl Into<String>,
        contact_info: impl Into<String>,
        admin_user_id: UserId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: CompanyId::new_v7(),
            name: name.into(),
            contact_info: contact_info.into(),
            admin_user_id,
            created_at: now,
            updated_at: now,
        }
    }
}
