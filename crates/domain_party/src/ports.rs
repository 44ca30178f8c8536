//! Party domain ports
//!
//! The `PartyStore` trait defines the persistence operations the registry
//! needs. Adapters implement it against PostgreSQL (infra_db) or in memory
//! (mock, for tests).

use async_trait::async_trait;

use core_kernel::{CompanyId, HospitalId, StoreError, UserId};

use crate::account::UserAccount;
use crate::organization::{Hospital, InsuranceCompany};

/// Persistence port for the organization registry and user accounts
#[async_trait]
pub trait PartyStore: Send + Sync {
    /// Creates a hospital together with its bootstrap admin account.
    ///
    /// Both records are written atomically; a partially-bootstrapped
    /// organization is never observable.
    async fn create_hospital(
        &self,
        hospital: &Hospital,
        admin: &UserAccount,
    ) -> Result<(), StoreError>;

    /// Creates an insurance company together with its bootstrap admin account
    async fn create_company(
        &self,
        company: &InsuranceCompany,
        admin: &UserAccount,
    ) -> Result<(), StoreError>;

    async fn get_hospital(&self, id: HospitalId) -> Result<Option<Hospital>, StoreError>;

    async fn get_company(&self, id: CompanyId) -> Result<Option<InsuranceCompany>, StoreError>;

    async fn list_hospitals(&self) -> Result<Vec<Hospital>, StoreError>;

    async fn list_companies(&self) -> Result<Vec<InsuranceCompany>, StoreError>;

    async fn delete_hospital(&self, id: HospitalId) -> Result<(), StoreError>;

    async fn delete_company(&self, id: CompanyId) -> Result<(), StoreError>;

    async fn get_account(&self, id: UserId) -> Result<Option<UserAccount>, StoreError>;

    async fn find_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserAccount>, StoreError>;
}

/// In-memory implementation of `PartyStore` for tests
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::RwLock;

    #[derive(Debug, Default)]
    pub struct MockPartyStore {
        hospitals: Arc<RwLock<HashMap<HospitalId, Hospital>>>,
        companies: Arc<RwLock<HashMap<CompanyId, InsuranceCompany>>>,
        accounts: Arc<RwLock<HashMap<UserId, UserAccount>>>,
    }

    impl MockPartyStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl PartyStore for MockPartyStore {
        async fn create_hospital(
            &self,
            hospital: &Hospital,
            admin: &UserAccount,
        ) -> Result<(), StoreError> {
            if self
                .find_account_by_username(&admin.username)
                .await?
                .is_some()
            {
                return Err(StoreError::Conflict(format!(
                    "username already taken: {}",
                    admin.username
                )));
            }
            self.accounts.write().await.insert(admin.id, admin.clone());
            self.hospitals
                .write()
                .await
                .insert(hospital.id, hospital.clone());
            Ok(())
        }

        async fn create_company(
            &self,
            company: &InsuranceCompany,
            admin: &UserAccount,
        ) -> Result<(), StoreError> {
            if self
                .find_account_by_username(&admin.username)
                .await?
                .is_some()
            {
                return Err(StoreError::Conflict(format!(
                    "username already taken: {}",
                    admin.username
                )));
            }
            self.accounts.write().await.insert(admin.id, admin.clone());
            self.companies
                .write()
                .await
                .insert(company.id, company.clone());
            Ok(())
        }

        async fn get_hospital(&self, id: HospitalId) -> Result<Option<Hospital>, StoreError> {
            Ok(self.hospitals.read().await.get(&id).cloned())
        }

        async fn get_company(
            &self,
            id: CompanyId,
        ) -> Result<Option<InsuranceCompany>, StoreError> {
            Ok(self.companies.read().await.get(&id).cloned())
        }

        async fn list_hospitals(&self) -> Result<Vec<Hospital>, StoreError> {
            let mut hospitals: Vec<_> = self.hospitals.read().await.values().cloned().collect();
            hospitals.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            Ok(hospitals)
        }

        async fn list_companies(&self) -> Result<Vec<InsuranceCompany>, StoreError> {
            let mut companies: Vec<_> = self.companies.read().await.values().cloned().collect();
            companies.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            Ok(companies)
        }

        async fn delete_hospital(&self, id: HospitalId) -> Result<(), StoreError> {
            self.hospitals
                .write()
                .await
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| StoreError::not_found("Hospital", id))
        }

        async fn delete_company(&self, id: CompanyId) -> Result<(), StoreError> {
            self.companies
                .write()
                .await
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| StoreError::not_found("InsuranceCompany", id))
        }

        async fn get_account(&self, id: UserId) -> Result<Option<UserAccount>, StoreError> {
            Ok(self.accounts.read().await.get(&id).cloned())
        }

        async fn find_account_by_username(
            &self,
            username: &str,
        ) -> Result<Option<UserAccount>, StoreError> {
            Ok(self
                .accounts
                .read()
                .await
                .values()
                .find(|a| a.username == username)
                .cloned())
        }
    }
}
