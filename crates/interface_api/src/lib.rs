//! HTTP API Layer
//!
//! This crate provides the REST API for the claim lifecycle engine using
//! Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers per domain, orchestrating gate checks,
//!   aggregate transitions, and compare-and-swap persistence
//! - **Middleware**: Authentication, audit logging, tracing
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent `{ error, detail }` responses

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use domain_claims::adapters::http_verifier::{HttpVerificationClient, HttpVerifierConfig};
use domain_claims::{ClaimStore, VerificationError, VerificationService};
use domain_party::PartyStore;
use domain_policy::adapters::{HttpAnalyzerClient, HttpAnalyzerConfig};
use domain_policy::{PolicyAnalyzer, PolicyStore};
use infra_db::{PgClaimStore, PgPartyStore, PgPolicyStore};

use crate::config::ApiConfig;
use crate::handlers::{claims, health, party, policy};
use crate::middleware::{audit_middleware, auth_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub claims: Arc<dyn ClaimStore>,
    pub policies: Arc<dyn PolicyStore>,
    pub parties: Arc<dyn PartyStore>,
    pub verifier: Arc<dyn VerificationService>,
    pub analyzer: Arc<dyn PolicyAnalyzer>,
    pub config: ApiConfig,
}

impl AppState {
    /// Wires the state against PostgreSQL stores and the HTTP verifier and
    /// analyzer clients
    pub fn postgres(pool: PgPool, config: ApiConfig) -> Result<Self, VerificationError> {
        let verifier = HttpVerificationClient::new(HttpVerifierConfig {
            base_url: config.verifier_url.clone(),
            api_key: config.verifier_api_key.clone(),
            timeout_secs: config.verifier_timeout_secs,
        })?;
        let analyzer = HttpAnalyzerClient::new(HttpAnalyzerConfig {
            base_url: config.verifier_url.clone(),
            api_key: config.verifier_api_key.clone(),
            timeout_secs: config.verifier_timeout_secs,
        })
        .map_err(|e| VerificationError::Unavailable(e.to_string()))?;

        Ok(Self {
            claims: Arc::new(PgClaimStore::new(pool.clone())),
            policies: Arc::new(PgPolicyStore::new(pool.clone())),
            parties: Arc::new(PgPartyStore::new(pool)),
            verifier: Arc::new(verifier),
            analyzer: Arc::new(analyzer),
            config,
        })
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    // Claims routes
    let claims_routes = Router::new()
        .route("/", post(claims::create_claim))
        .route("/", get(claims::list_claims))
        .route("/:id", get(claims::get_claim))
        .route("/:id", put(claims::update_claim))
        .route("/:id", delete(claims::delete_claim))
        .route("/:id/documents", post(claims::upload_document))
        .route("/:id/verify", post(claims::request_verification))
        .route("/:id/submit-review", post(claims::submit_for_review))
        .route("/:id/decision", post(claims::decide_claim));

    // Policy routes
    let policy_routes = Router::new()
        .route("/", post(policy::create_policy))
        .route("/", get(policy::list_policies))
        .route("/drafts", post(policy::create_draft_policy))
        .route("/:id", get(policy::get_policy))
        .route("/:id/requirements", put(policy::update_requirements))
        .route("/:id/finalize", post(policy::finalize_policy))
        .route("/:id/hospitals", put(policy::connect_hospitals));

    // Registry routes (platform admin)
    let registry_routes = Router::new()
        .route("/hospitals", post(party::create_hospital))
        .route("/hospitals", get(party::list_hospitals))
        .route("/hospitals/:id", get(party::get_hospital))
        .route("/hospitals/:id", delete(party::delete_hospital))
        .route("/companies", post(party::create_company))
        .route("/companies", get(party::list_companies))
        .route("/companies/:id", get(party::get_company))
        .route("/companies/:id", delete(party::delete_company));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/claims", claims_routes)
        .nest("/policies", policy_routes)
        .nest("/registry", registry_routes)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            audit_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
