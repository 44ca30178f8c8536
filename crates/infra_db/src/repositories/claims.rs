//! PostgreSQL implementation of `ClaimStore`
//!
//! Concurrency contract: `update` is a compare-and-swap guarded by the
//! `version` column; `upsert_document` takes a row lock on the claim, checks
//! it is still in draft, and applies an `ON CONFLICT` upsert keyed by the
//! normalized document name. Both paths serialize on the claim row, never on
//! a table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use core_kernel::{ClaimId, HospitalId, PolicyId, StoreError, UserId};
use domain_claims::{
    Claim, ClaimStatus, ClaimStore, PolicyType, UploadedDocument, VerificationReport,
};
use domain_claims::reconcile::name_key;

use crate::error::store_err;

/// Claim repository backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PgClaimStore {
    pool: PgPool,
}

impl PgClaimStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ClaimRow {
    claim_id: Uuid,
    hospital_id: Uuid,
    patient_name: String,
    age: i32,
    diagnosis: String,
    treatment_plan: String,
    policy_type: String,
    policy_id: Option<Uuid>,
    status: String,
    verification: Option<serde_json::Value>,
    rejection_reason: Option<String>,
    decided_by: Option<Uuid>,
    decided_at: Option<DateTime<Utc>>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    claim_id: Uuid,
    document_name: String,
    storage_reference: String,
    uploaded_at: DateTime<Utc>,
}

const CLAIM_COLUMNS: &str = "claim_id, hospital_id, patient_name, age, diagnosis, \
     treatment_plan, policy_type, policy_id, status, verification, rejection_reason, \
     decided_by, decided_at, version, created_at, updated_at";

fn encode_status(status: ClaimStatus) -> &'static str {
    match status {
        ClaimStatus::Draft => "DRAFT",
        ClaimStatus::AwaitingVerification => "AWAITING_VERIFICATION",
        ClaimStatus::ReviewReady => "REVIEW_READY",
        ClaimStatus::Approved => "APPROVED",
        ClaimStatus::Rejected => "REJECTED",
    }
}

fn decode_status(s: &str) -> Result<ClaimStatus, StoreError> {
    match s {
        "DRAFT" => Ok(ClaimStatus::Draft),
        "AWAITING_VERIFICATION" => Ok(ClaimStatus::AwaitingVerification),
        "REVIEW_READY" => Ok(ClaimStatus::ReviewReady),
        "APPROVED" => Ok(ClaimStatus::Approved),
        "REJECTED" => Ok(ClaimStatus::Rejected),
        other => Err(StoreError::Unavailable(format!(
            "unrecognized claim status in storage: {other}"
        ))),
    }
}

fn encode_policy_type(policy_type: PolicyType) -> &'static str {
    match policy_type {
        PolicyType::Cashless => "CASHLESS",
        PolicyType::Reimbursement => "REIMBURSEMENT",
    }
}

fn decode_policy_type(s: &str) -> Result<PolicyType, StoreError> {
    match s {
        "CASHLESS" => Ok(PolicyType::Cashless),
        "REIMBURSEMENT" => Ok(PolicyType::Reimbursement),
        other => Err(StoreError::Unavailable(format!(
            "unrecognized policy type in storage: {other}"
        ))),
    }
}

fn into_claim(row: ClaimRow, documents: Vec<UploadedDocument>) -> Result<Claim, StoreError> {
    let verification: Option<VerificationReport> = row
        .verification
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| StoreError::Unavailable(format!("corrupt verification report: {e}")))?;
    Ok(Claim {
        id: ClaimId::from(row.claim_id),
        hospital_id: HospitalId::from(row.hospital_id),
        patient_name: row.patient_name,
        age: row.age,
        diagnosis: row.diagnosis,
        treatment_plan: row.treatment_plan,
        policy_type: decode_policy_type(&row.policy_type)?,
        policy_id: row.policy_id.map(PolicyId::from),
        documents,
        verification,
        status: decode_status(&row.status)?,
        rejection_reason: row.rejection_reason,
        decided_by: row.decided_by.map(UserId::from),
        decided_at: row.decided_at,
        version: row.version,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn verification_json(claim: &Claim) -> Result<Option<serde_json::Value>, StoreError> {
    claim
        .verification
        .as_ref()
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| StoreError::Unavailable(format!("unserializable verification report: {e}")))
}

impl PgClaimStore {
    async fn documents_for(&self, claim_id: Uuid) -> Result<Vec<UploadedDocument>, StoreError> {
        let rows: Vec<DocumentRow> = sqlx::query_as(
            "SELECT claim_id, document_name, storage_reference, uploaded_at \
             FROM claim_documents WHERE claim_id = $1 ORDER BY seq",
        )
        .bind(claim_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(rows
            .into_iter()
            .map(|r| UploadedDocument {
                document_name: r.document_name,
                storage_reference: r.storage_reference,
                uploaded_at: r.uploaded_at,
            })
            .collect())
    }

    /// Assembles full aggregates for a page of claim rows with one documents
    /// query instead of one per claim.
    async fn assemble(&self, rows: Vec<ClaimRow>) -> Result<Vec<Claim>, StoreError> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.claim_id).collect();
        let doc_rows: Vec<DocumentRow> = sqlx::query_as(
            "SELECT claim_id, document_name, storage_reference, uploaded_at \
             FROM claim_documents WHERE claim_id = ANY($1) ORDER BY claim_id, seq",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        let mut by_claim: std::collections::HashMap<Uuid, Vec<UploadedDocument>> =
            std::collections::HashMap::new();
        for r in doc_rows {
            by_claim.entry(r.claim_id).or_default().push(UploadedDocument {
                document_name: r.document_name,
                storage_reference: r.storage_reference,
                uploaded_at: r.uploaded_at,
            });
        }

        rows.into_iter()
            .map(|row| {
                let documents = by_claim.remove(&row.claim_id).unwrap_or_default();
                into_claim(row, documents)
            })
            .collect()
    }
}

#[async_trait]
impl ClaimStore for PgClaimStore {
    async fn insert(&self, claim: &Claim) -> Result<(), StoreError> {
        let verification = verification_json(claim)?;
        sqlx::query(
            "INSERT INTO claims (claim_id, hospital_id, patient_name, age, diagnosis, \
             treatment_plan, policy_type, policy_id, status, verification, rejection_reason, \
             decided_by, decided_at, version, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)",
        )
        .bind(Uuid::from(claim.id))
        .bind(Uuid::from(claim.hospital_id))
        .bind(&claim.patient_name)
        .bind(claim.age)
        .bind(&claim.diagnosis)
        .bind(&claim.treatment_plan)
        .bind(encode_policy_type(claim.policy_type))
        .bind(claim.policy_id.map(Uuid::from))
        .bind(encode_status(claim.status))
        .bind(verification)
        .bind(&claim.rejection_reason)
        .bind(claim.decided_by.map(Uuid::from))
        .bind(claim.decided_at)
        .bind(claim.version)
        .bind(claim.created_at)
        .bind(claim.updated_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn get(&self, id: ClaimId) -> Result<Option<Claim>, StoreError> {
        let row: Option<ClaimRow> =
            sqlx::query_as(&format!("SELECT {CLAIM_COLUMNS} FROM claims WHERE claim_id = $1"))
                .bind(Uuid::from(id))
                .fetch_optional(&self.pool)
                .await
                .map_err(store_err)?;
        match row {
            Some(row) => {
                let documents = self.documents_for(row.claim_id).await?;
                Ok(Some(into_claim(row, documents)?))
            }
            None => Ok(None),
        }
    }

    async fn update(&self, claim: &Claim, expected_version: i64) -> Result<Claim, StoreError> {
        let verification = verification_json(claim)?;
        let next_version = expected_version + 1;
        let result = sqlx::query(
            "UPDATE claims SET patient_name = $2, age = $3, diagnosis = $4, \
             treatment_plan = $5, policy_type = $6, policy_id = $7, status = $8, \
             verification = $9, rejection_reason = $10, decided_by = $11, decided_at = $12, \
             version = $13, updated_at = $14 \
             WHERE claim_id = $1 AND version = $15",
        )
        .bind(Uuid::from(claim.id))
        .bind(&claim.patient_name)
        .bind(claim.age)
        .bind(&claim.diagnosis)
        .bind(&claim.treatment_plan)
        .bind(encode_policy_type(claim.policy_type))
        .bind(claim.policy_id.map(Uuid::from))
        .bind(encode_status(claim.status))
        .bind(verification)
        .bind(&claim.rejection_reason)
        .bind(claim.decided_by.map(Uuid::from))
        .bind(claim.decided_at)
        .bind(next_version)
        .bind(claim.updated_at)
        .bind(expected_version)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        if result.rows_affected() == 0 {
            // Distinguish a lost race from a vanished claim
            let exists: Option<(i64,)> =
                sqlx::query_as("SELECT version FROM claims WHERE claim_id = $1")
                    .bind(Uuid::from(claim.id))
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(store_err)?;
            return match exists {
                Some(_) => Err(StoreError::version_conflict("Claim", claim.id, expected_version)),
                None => Err(StoreError::not_found("Claim", claim.id)),
            };
        }

        let mut persisted = claim.clone();
        persisted.version = next_version;
        Ok(persisted)
    }

    async fn upsert_document(
        &self,
        id: ClaimId,
        document: UploadedDocument,
    ) -> Result<Claim, StoreError> {
        let claim_id = Uuid::from(id);
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let status: Option<(String,)> =
            sqlx::query_as("SELECT status FROM claims WHERE claim_id = $1 FOR UPDATE")
                .bind(claim_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(store_err)?;
        match status {
            None => return Err(StoreError::not_found("Claim", id)),
            Some((s,)) if decode_status(&s)? != ClaimStatus::Draft => {
                return Err(StoreError::Conflict(
                    "documents can only be uploaded while the claim is in draft".to_string(),
                ));
            }
            Some(_) => {}
        }

        sqlx::query(
            "INSERT INTO claim_documents (claim_id, name_key, document_name, \
             storage_reference, uploaded_at) VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (claim_id, name_key) DO UPDATE SET \
             document_name = EXCLUDED.document_name, \
             storage_reference = EXCLUDED.storage_reference, \
             uploaded_at = EXCLUDED.uploaded_at",
        )
        .bind(claim_id)
        .bind(name_key(&document.document_name))
        .bind(&document.document_name)
        .bind(&document.storage_reference)
        .bind(document.uploaded_at)
        .execute(&mut *tx)
        .await
        .map_err(store_err)?;

        sqlx::query("UPDATE claims SET updated_at = $2 WHERE claim_id = $1")
            .bind(claim_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

        tx.commit().await.map_err(store_err)?;

        self.get(id)
            .await?
            .ok_or_else(|| StoreError::not_found("Claim", id))
    }

    async fn list_for_hospital(&self, hospital_id: HospitalId) -> Result<Vec<Claim>, StoreError> {
        let rows: Vec<ClaimRow> = sqlx::query_as(&format!(
            "SELECT {CLAIM_COLUMNS} FROM claims WHERE hospital_id = $1 ORDER BY created_at DESC"
        ))
        .bind(Uuid::from(hospital_id))
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        self.assemble(rows).await
    }

    async fn list_for_policies(
        &self,
        policy_ids: &[PolicyId],
        status: Option<ClaimStatus>,
    ) -> Result<Vec<Claim>, StoreError> {
        let ids: Vec<Uuid> = policy_ids.iter().map(|p| Uuid::from(*p)).collect();
        let rows: Vec<ClaimRow> = sqlx::query_as(&format!(
            "SELECT {CLAIM_COLUMNS} FROM claims \
             WHERE policy_id = ANY($1) AND ($2::TEXT IS NULL OR status = $2) \
             ORDER BY created_at DESC"
        ))
        .bind(&ids)
        .bind(status.map(encode_status))
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        self.assemble(rows).await
    }

    async fn delete(&self, id: ClaimId) -> Result<(), StoreError> {
        // claim_documents rows go with the claim via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM claims WHERE claim_id = $1")
            .bind(Uuid::from(id))
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Claim", id));
        }
        Ok(())
    }
}
