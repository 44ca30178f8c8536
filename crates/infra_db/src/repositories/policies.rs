//! PostgreSQL implementation of `PolicyStore`
//!
//! The requirement checklist is stored as a JSONB document; ownership is a
//! pair of nullable columns constrained to exactly one non-null side.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use core_kernel::{CompanyId, HospitalId, PolicyId, StoreError};
use domain_policy::{Policy, PolicyOwner, PolicyStatus, PolicyStore, RequiredDocument};

use crate::error::store_err;

/// Policy repository backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PgPolicyStore {
    pool: PgPool,
}

impl PgPolicyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PolicyRow {
    policy_id: Uuid,
    name: String,
    owner_company_id: Option<Uuid>,
    owner_hospital_id: Option<Uuid>,
    status: String,
    required_documents: serde_json::Value,
    connected_hospital_ids: Vec<Uuid>,
    coverage_notes: Option<String>,
    source_document: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

const POLICY_COLUMNS: &str = "policy_id, name, owner_company_id, owner_hospital_id, status, \
     required_documents, connected_hospital_ids, coverage_notes, source_document, \
     created_at, updated_at";

fn encode_status(status: PolicyStatus) -> &'static str {
    match status {
        PolicyStatus::Draft => "DRAFT",
        PolicyStatus::Active => "ACTIVE",
    }
}

fn decode_status(s: &str) -> Result<PolicyStatus, StoreError> {
    match s {
        "DRAFT" => Ok(PolicyStatus::Draft),
        "ACTIVE" => Ok(PolicyStatus::Active),
        other => Err(StoreError::Unavailable(format!(
            "unrecognized policy status in storage: {other}"
        ))),
    }
}

fn into_policy(row: PolicyRow) -> Result<Policy, StoreError> {
    let owner = match (row.owner_company_id, row.owner_hospital_id) {
        (Some(company), None) => PolicyOwner::Insurer(CompanyId::from(company)),
        (None, Some(hospital)) => PolicyOwner::Hospital(HospitalId::from(hospital)),
        _ => {
            return Err(StoreError::Unavailable(format!(
                "policy {} has an inconsistent owner",
                row.policy_id
            )))
        }
    };
    let required_documents: Vec<RequiredDocument> =
        serde_json::from_value(row.required_documents)
            .map_err(|e| StoreError::Unavailable(format!("corrupt requirement set: {e}")))?;
    Ok(Policy {
        id: PolicyId::from(row.policy_id),
        name: row.name,
        owner,
        status: decode_status(&row.status)?,
        required_documents,
        connected_hospital_ids: row
            .connected_hospital_ids
            .into_iter()
            .map(HospitalId::from)
            .collect(),
        coverage_notes: row.coverage_notes,
        source_document: row.source_document,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn requirements_json(policy: &Policy) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(&policy.required_documents)
        .map_err(|e| StoreError::Unavailable(format!("unserializable requirement set: {e}")))
}

#[async_trait]
impl PolicyStore for PgPolicyStore {
    async fn insert(&self, policy: &Policy) -> Result<(), StoreError> {
        let required_documents = requirements_json(policy)?;
        let connected: Vec<Uuid> = policy
            .connected_hospital_ids
            .iter()
            .map(|h| Uuid::from(*h))
            .collect();
        sqlx::query(
            "INSERT INTO policies (policy_id, name, owner_company_id, owner_hospital_id, \
             status, required_documents, connected_hospital_ids, coverage_notes, \
             source_document, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(Uuid::from(policy.id))
        .bind(&policy.name)
        .bind(policy.owner.company_id().map(Uuid::from))
        .bind(policy.owner.hospital_id().map(Uuid::from))
        .bind(encode_status(policy.status))
        .bind(required_documents)
        .bind(&connected)
        .bind(&policy.coverage_notes)
        .bind(&policy.source_document)
        .bind(policy.created_at)
        .bind(policy.updated_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn get(&self, id: PolicyId) -> Result<Option<Policy>, StoreError> {
        let row: Option<PolicyRow> = sqlx::query_as(&format!(
            "SELECT {POLICY_COLUMNS} FROM policies WHERE policy_id = $1"
        ))
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;
        row.map(into_policy).transpose()
    }

    async fn update(&self, policy: &Policy) -> Result<(), StoreError> {
        let required_documents = requirements_json(policy)?;
        let connected: Vec<Uuid> = policy
            .connected_hospital_ids
            .iter()
            .map(|h| Uuid::from(*h))
            .collect();
        let result = sqlx::query(
            "UPDATE policies SET name = $2, status = $3, required_documents = $4, \
             connected_hospital_ids = $5, coverage_notes = $6, source_document = $7, \
             updated_at = $8 WHERE policy_id = $1",
        )
        .bind(Uuid::from(policy.id))
        .bind(&policy.name)
        .bind(encode_status(policy.status))
        .bind(required_documents)
        .bind(&connected)
        .bind(&policy.coverage_notes)
        .bind(&policy.source_document)
        .bind(policy.updated_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Policy", policy.id));
        }
        Ok(())
    }

    async fn list_for_hospital(&self, hospital_id: HospitalId) -> Result<Vec<Policy>, StoreError> {
        let rows: Vec<PolicyRow> = sqlx::query_as(&format!(
            "SELECT {POLICY_COLUMNS} FROM policies \
             WHERE owner_hospital_id = $1 OR $1 = ANY(connected_hospital_ids) \
             ORDER BY created_at"
        ))
        .bind(Uuid::from(hospital_id))
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        rows.into_iter().map(into_policy).collect()
    }

    async fn list_for_company(&self, company_id: CompanyId) -> Result<Vec<Policy>, StoreError> {
        let rows: Vec<PolicyRow> = sqlx::query_as(&format!(
            "SELECT {POLICY_COLUMNS} FROM policies WHERE owner_company_id = $1 \
             ORDER BY created_at"
        ))
        .bind(Uuid::from(company_id))
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        rows.into_iter().map(into_policy).collect()
    }
}
