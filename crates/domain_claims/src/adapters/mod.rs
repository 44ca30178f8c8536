//! Adapters for the claims domain's external collaborators

pub mod http_verifier;

pub use http_verifier::{HttpVerifierConfig, HttpVerificationClient};
