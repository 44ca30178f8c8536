//! Core error types used across the system

use thiserror::Error;

/// Errors returned by store ports (database, in-memory, external systems).
///
/// Every persistence adapter maps its native failures onto these variants so
/// the domain and API layers stay independent of the backing technology.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested entity was not found
    #[error("Not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    /// Optimistic-concurrency update lost the race: the stored version no
    /// longer matches the version the caller read.
    #[error("Version conflict on {entity_type} {id}: expected version {expected}")]
    VersionConflict {
        entity_type: String,
        id: String,
        expected: i64,
    },

    /// The operation conflicts with the entity's current state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The underlying storage is unavailable
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn not_found(entity_type: impl Into<String>, id: impl ToString) -> Self {
        StoreError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    pub fn version_conflict(
        entity_type: impl Into<String>,
        id: impl ToString,
        expected: i64,
    ) -> Self {
        StoreError::VersionConflict {
            entity_type: entity_type.into(),
            id: id.to_string(),
            expected,
        }
    }

    /// True when the error is a NotFound
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// True when the error is a lost optimistic-concurrency race
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, StoreError::VersionConflict { .. })
    }
}
