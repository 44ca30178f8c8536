//! Authorization gate
//!
//! Maps (actor, resource, requested action) to permit/deny. The gate is
//! stateless per call: it derives its answer solely from its inputs, never
//! from session history, and is consulted before any mutating action reaches
//! the workflow. Transition legality itself stays in the domain aggregates;
//! this crate only answers who may attempt what.
//!
//! Cross-tenant denials are `Hidden` so the API boundary can render them as
//! NOT_FOUND - existence of another tenant's claim or policy is never
//! revealed through a FORBIDDEN/NOT_FOUND distinction.

pub mod actor;
pub mod gate;

pub use actor::Actor;
pub use gate::{
    authorize_claim, authorize_policy, claim_owner_scope, require_platform_admin, AccessDenied,
    ClaimAction, PolicyAction,
};
