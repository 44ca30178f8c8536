//! PostgreSQL implementation of `PartyStore`
//!
//! Organization bootstrap writes the admin account and the organization row
//! in one transaction; the unique index on usernames turns duplicate
//! bootstrap attempts into a `Conflict`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use core_kernel::{CompanyId, HospitalId, StoreError, UserId};
use domain_party::{Hospital, InsuranceCompany, PartyStore, UserAccount, UserRole};

use crate::error::store_err;

/// Registry repository backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PgPartyStore {
    pool: PgPool,
}

impl PgPartyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct HospitalRow {
    hospital_id: Uuid,
    name: String,
    address: String,
    contact_info: String,
    admin_user_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct CompanyRow {
    company_id: Uuid,
    name: String,
    contact_info: String,
    admin_user_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    user_id: Uuid,
    username: String,
    email: Option<String>,
    display_name: String,
    role: String,
    hospital_id: Option<Uuid>,
    company_id: Option<Uuid>,
    password_hash: String,
    created_at: DateTime<Utc>,
}

const ACCOUNT_COLUMNS: &str = "user_id, username, email, display_name, role, hospital_id, \
     company_id, password_hash, created_at";

fn encode_role(role: UserRole) -> &'static str {
    match role {
        UserRole::PlatformAdmin => "platform_admin",
        UserRole::HospitalAdmin => "hospital_admin",
        UserRole::InsuranceAdmin => "insurance_admin",
    }
}

fn decode_role(s: &str) -> Result<UserRole, StoreError> {
    match s {
        "platform_admin" => Ok(UserRole::PlatformAdmin),
        "hospital_admin" => Ok(UserRole::HospitalAdmin),
        "insurance_admin" => Ok(UserRole::InsuranceAdmin),
        other => Err(StoreError::Unavailable(format!(
            "unrecognized role in storage: {other}"
        ))),
    }
}

impl From<HospitalRow> for Hospital {
    fn from(row: HospitalRow) -> Self {
        Hospital {
            id: HospitalId::from(row.hospital_id),
            name: row.name,
            address: row.address,
            contact_info: row.contact_info,
            admin_user_id: UserId::from(row.admin_user_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<CompanyRow> for InsuranceCompany {
    fn from(row: CompanyRow) -> Self {
        InsuranceCompany {
            id: CompanyId::from(row.company_id),
            name: row.name,
            contact_info: row.contact_info,
            admin_user_id: UserId::from(row.admin_user_id),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn into_account(row: AccountRow) -> Result<UserAccount, StoreError> {
    Ok(UserAccount {
        id: UserId::from(row.user_id),
        username: row.username,
        email: row.email,
        display_name: row.display_name,
        role: decode_role(&row.role)?,
        hospital_id: row.hospital_id.map(HospitalId::from),
        company_id: row.company_id.map(CompanyId::from),
        password_hash: row.password_hash,
        created_at: row.created_at,
    })
}

async fn insert_account(
    tx: &mut Transaction<'_, Postgres>,
    account: &UserAccount,
) -> Result<(), StoreError> {
    sqlx::query(
        "INSERT INTO user_accounts (user_id, username, email, display_name, role, \
         hospital_id, company_id, password_hash, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(Uuid::from(account.id))
    .bind(&account.username)
    .bind(&account.email)
    .bind(&account.display_name)
    .bind(encode_role(account.role))
    .bind(account.hospital_id.map(Uuid::from))
    .bind(account.company_id.map(Uuid::from))
    .bind(&account.password_hash)
    .bind(account.created_at)
    .execute(&mut **tx)
    .await
    .map_err(store_err)?;
    Ok(())
}

#[async_trait]
impl PartyStore for PgPartyStore {
    async fn create_hospital(
        &self,
        hospital: &Hospital,
        admin: &UserAccount,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;
        insert_account(&mut tx, admin).await?;
        sqlx::query(
            "INSERT INTO hospitals (hospital_id, name, address, contact_info, \
             admin_user_id, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(Uuid::from(hospital.id))
        .bind(&hospital.name)
        .bind(&hospital.address)
        .bind(&hospital.contact_info)
        .bind(Uuid::from(hospital.admin_user_id))
        .bind(hospital.created_at)
        .bind(hospital.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;
        tx.commit().await.map_err(store_err)
    }

    async fn create_company(
        &self,
        company: &InsuranceCompany,
        admin: &UserAccount,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;
        insert_account(&mut tx, admin).await?;
        sqlx::query(
            "INSERT INTO insurance_companies (company_id, name, contact_info, \
             admin_user_id, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(Uuid::from(company.id))
        .bind(&company.name)
        .bind(&company.contact_info)
        .bind(Uuid::from(company.admin_user_id))
        .bind(company.created_at)
        .bind(company.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;
        tx.commit().await.map_err(store_err)
    }

    async fn get_hospital(&self, id: HospitalId) -> Result<Option<Hospital>, StoreError> {
        let row: Option<HospitalRow> = sqlx::query_as(
            "SELECT hospital_id, name, address, contact_info, admin_user_id, \
             created_at, updated_at FROM hospitals WHERE hospital_id = $1",
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(row.map(Hospital::from))
    }

    async fn get_company(&self, id: CompanyId) -> Result<Option<InsuranceCompany>, StoreError> {
        let row: Option<CompanyRow> = sqlx::query_as(
            "SELECT company_id, name, contact_info, admin_user_id, created_at, updated_at \
             FROM insurance_companies WHERE company_id = $1",
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(row.map(InsuranceCompany::from))
    }

    async fn list_hospitals(&self) -> Result<Vec<Hospital>, StoreError> {
        let rows: Vec<HospitalRow> = sqlx::query_as(
            "SELECT hospital_id, name, address, contact_info, admin_user_id, \
             created_at, updated_at FROM hospitals ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(rows.into_iter().map(Hospital::from).collect())
    }

    async fn list_companies(&self) -> Result<Vec<InsuranceCompany>, StoreError> {
        let rows: Vec<CompanyRow> = sqlx::query_as(
            "SELECT company_id, name, contact_info, admin_user_id, created_at, updated_at \
             FROM insurance_companies ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(rows.into_iter().map(InsuranceCompany::from).collect())
    }

    async fn delete_hospital(&self, id: HospitalId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM hospitals WHERE hospital_id = $1")
            .bind(Uuid::from(id))
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Hospital", id));
        }
        Ok(())
    }

    async fn delete_company(&self, id: CompanyId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM insurance_companies WHERE company_id = $1")
            .bind(Uuid::from(id))
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("InsuranceCompany", id));
        }
        Ok(())
    }

    async fn get_account(&self, id: UserId) -> Result<Option<UserAccount>, StoreError> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM user_accounts WHERE user_id = $1"
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;
        row.map(into_account).transpose()
    }

    async fn find_account_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserAccount>, StoreError> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM user_accounts WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;
        row.map(into_account).transpose()
    }
}
