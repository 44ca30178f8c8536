//! Party domain - hospital and insurance company registry
//!
//! Organizations are created by the platform admin together with their
//! bootstrap admin accounts. The hospital/insurer link that authorizes an
//! insurer to see a hospital's claims lives on the policy (connected hospital
//! ids), not here; this crate only owns the registry entities and accounts.

pub mod account;
pub mod error;
pub mod organization;
pub mod ports;

pub use account::{UserAccount, UserRole};
pub use error::PartyError;
pub use organization::{Hospital, InsuranceCompany};
pub use ports::PartyStore;
