//! Gate decisions for claim and policy actions

use thiserror::Error;

use core_kernel::HospitalId;
use domain_claims::{Claim, ClaimStatus};
use domain_party::UserRole;
use domain_policy::Policy;

use crate::actor::Actor;

/// Denial outcome. `Hidden` must be rendered as NOT_FOUND at the API
/// boundary; `Forbidden` may be rendered as-is because it never crosses a
/// tenant boundary.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccessDenied {
    #[error("resource not visible to this actor")]
    Hidden,

    #[error("action not permitted: {0}")]
    Forbidden(String),
}

/// Mutating and reading actions on a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimAction {
    View,
    EditProfile,
    UploadDocument,
    RequestVerification,
    SubmitForReview,
    Decide,
    Delete,
}

/// Actions on a policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyAction {
    View,
    EditChecklist,
    Finalize,
    ConnectHospitals,
}

/// Resolves the hospital scope an actor creates claims under.
///
/// Only hospital admins create claims; the claim is owned by their hospital,
/// never by an id supplied in the request body.
pub fn claim_owner_scope(actor: &Actor) -> Result<HospitalId, AccessDenied> {
    match (actor.role, actor.hospital_id) {
        (UserRole::HospitalAdmin, Some(hospital_id)) => Ok(hospital_id),
        _ => Err(AccessDenied::Forbidden(
            "only hospital users create claims".to_string(),
        )),
    }
}

/// Requires the platform admin role (registry management)
pub fn require_platform_admin(actor: &Actor) -> Result<(), AccessDenied> {
    if actor.role == UserRole::PlatformAdmin {
        Ok(())
    } else {
        Err(AccessDenied::Forbidden(
            "platform administrator role required".to_string(),
        ))
    }
}

/// Authorizes an action on a claim.
///
/// `policy` is the claim's resolved policy, when it references one; it
/// carries the insurer scope for decision rights.
pub fn authorize_claim(
    actor: &Actor,
    claim: &Claim,
    policy: Option<&Policy>,
    action: ClaimAction,
) -> Result<(), AccessDenied> {
    match actor.role {
        UserRole::HospitalAdmin => {
            // A hospital only ever sees its own claims
            if actor.hospital_id != Some(claim.hospital_id) {
                return Err(AccessDenied::Hidden);
            }
            match action {
                ClaimAction::Decide => Err(AccessDenied::Forbidden(
                    "claims are decided by the insurer".to_string(),
                )),
                _ => Ok(()),
            }
        }
        UserRole::InsuranceAdmin => {
            // The insurer scope is derived from the claim's resolved policy
            let owns_policy = policy
                .and_then(|p| p.owner.company_id())
                .map_or(false, |company| actor.company_id == Some(company));
            if !owns_policy {
                return Err(AccessDenied::Hidden);
            }
            // Claims surface to the insurer only once submitted for review
            if claim.status == ClaimStatus::Draft
                || claim.status == ClaimStatus::AwaitingVerification
            {
                return Err(AccessDenied::Hidden);
            }
            match action {
                ClaimAction::View | ClaimAction::Decide => Ok(()),
                _ => Err(AccessDenied::Forbidden(
                    "insurers only review and decide claims".to_string(),
                )),
            }
        }
        UserRole::PlatformAdmin => Err(AccessDenied::Forbidden(
            "platform administrators have no claim authority".to_string(),
        )),
    }
}

/// Authorizes an action on a policy
pub fn authorize_policy(
    actor: &Actor,
    policy: &Policy,
    action: PolicyAction,
) -> Result<(), AccessDenied> {
    match actor.role {
        UserRole::HospitalAdmin => {
            let hospital_id = match actor.hospital_id {
                Some(id) => id,
                None => return Err(AccessDenied::Hidden),
            };
            let owns = policy.owner.hospital_id() == Some(hospital_id);
            let connected = policy.connected_hospital_ids.contains(&hospital_id);
            if !owns && !connected {
                return Err(AccessDenied::Hidden);
            }
            match action {
                PolicyAction::View => Ok(()),
                PolicyAction::EditChecklist | PolicyAction::Finalize if owns => Ok(()),
                PolicyAction::EditChecklist | PolicyAction::Finalize => {
                    Err(AccessDenied::Forbidden(
                        "only the owning hospital edits this policy".to_string(),
                    ))
                }
                PolicyAction::ConnectHospitals => Err(AccessDenied::Forbidden(
                    "hospital connections are maintained by the insurer".to_string(),
                )),
            }
        }
        UserRole::InsuranceAdmin => {
            let owns = policy
                .owner
                .company_id()
                .map_or(false, |company| actor.company_id == Some(company));
            if !owns {
                return Err(AccessDenied::Hidden);
            }
            Ok(())
        }
        UserRole::PlatformAdmin => Err(AccessDenied::Forbidden(
            "platform administrators have no policy authority".to_string(),
        )),
    }
}
