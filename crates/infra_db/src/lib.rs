//! PostgreSQL persistence adapters
//!
//! Implements the store ports declared by the domain crates. All queries are
//! runtime-checked; rows are mapped through plain row structs and converted
//! into domain aggregates at the edge.

pub mod error;
pub mod pool;
pub mod repositories;

pub use error::DatabaseError;
pub use pool::{create_pool, run_migrations, DatabaseConfig};
pub use repositories::claims::PgClaimStore;
pub use repositories::party::PgPartyStore;
pub use repositories::policies::PgPolicyStore;
