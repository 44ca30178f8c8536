//! Database error types and mapping onto the store port errors

use thiserror::Error;

use core_kernel::StoreError;

/// Infrastructure-level database errors (pool, migrations)
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Connection(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Maps a SQLx failure onto the store port error space.
///
/// RowNotFound never reaches callers through this path; repositories use
/// `fetch_optional` and translate absence explicitly.
pub(crate) fn store_err(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(db.message().to_string())
        }
        other => StoreError::Unavailable(other.to_string()),
    }
}
