//! API error handling
//!
//! Every failure renders as `{ "error": <machine code>, "detail": <human> }`.
//! Cross-tenant authorization failures arrive as `AccessDenied::Hidden` and
//! render as NOT_FOUND, so the existence of another tenant's resource is
//! never revealed.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use core_kernel::StoreError;
use domain_access::AccessDenied;
use domain_claims::{ClaimError, VerificationError};
use domain_policy::{AnalyzerError, PolicyError};

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or invalid input
    #[error("{detail}")]
    Validation { code: &'static str, detail: String },

    /// The request is well-formed but the workflow precondition is unmet
    #[error("{detail}")]
    Precondition { code: &'static str, detail: String },

    /// The request conflicts with the entity's current state or lost a race
    #[error("{detail}")]
    Conflict { code: &'static str, detail: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Unauthorized")]
    Unauthorized,

    /// An external collaborator failed; no partial state was written
    #[error("Upstream service unavailable: {0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, detail) = match self {
            ApiError::Validation { code, detail } => (StatusCode::BAD_REQUEST, code, detail),
            ApiError::Precondition { code, detail } => (StatusCode::BAD_REQUEST, code, detail),
            ApiError::Conflict { code, detail } => (StatusCode::CONFLICT, code, detail),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail),
            ApiError::Forbidden(detail) => (StatusCode::FORBIDDEN, "FORBIDDEN", detail),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Unauthorized".to_string(),
            ),
            ApiError::Upstream(detail) => {
                (StatusCode::BAD_GATEWAY, "UPSTREAM_UNAVAILABLE", detail)
            }
            ApiError::Internal(detail) => {
                tracing::error!(%detail, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", detail)
            }
        };

        let body = ErrorResponse {
            error: code.to_string(),
            detail,
        };

        (status, Json(body)).into_response()
    }
}

impl ApiError {
    pub fn validation(detail: impl Into<String>) -> Self {
        ApiError::Validation {
            code: "VALIDATION",
            detail: detail.into(),
        }
    }
}

impl From<ClaimError> for ApiError {
    fn from(err: ClaimError) -> Self {
        let code = err.reason_code();
        let detail = err.to_string();
        match err {
            ClaimError::ClaimNotFound(_) => ApiError::NotFound(detail),
            ClaimError::PolicyRequired | ClaimError::RejectionReasonRequired => {
                ApiError::Validation { code, detail }
            }
            ClaimError::NoDocumentsUploaded
            | ClaimError::MissingMandatoryDocuments { .. }
            | ClaimError::NotReadyForReview => ApiError::Precondition { code, detail },
            ClaimError::NotDraft { .. }
            | ClaimError::NotReviewReady { .. }
            | ClaimError::AlreadyDecided { .. }
            | ClaimError::VerificationNotInFlight
            | ClaimError::TerminalClaimImmutable => ApiError::Conflict { code, detail },
        }
    }
}

impl From<PolicyError> for ApiError {
    fn from(err: PolicyError) -> Self {
        let detail = err.to_string();
        match err {
            PolicyError::PolicyNotFound(_) => ApiError::NotFound(detail),
            PolicyError::EmptyDocumentName => ApiError::Validation {
                code: "EMPTY_DOCUMENT_NAME",
                detail,
            },
            PolicyError::DuplicateDocumentName(_) => ApiError::Validation {
                code: "DUPLICATE_DOCUMENT_NAME",
                detail,
            },
            PolicyError::NotActive => ApiError::Validation {
                code: "POLICY_NOT_ACTIVE",
                detail,
            },
            PolicyError::NotInsurerOwned => ApiError::Validation {
                code: "NOT_INSURER_OWNED",
                detail,
            },
            PolicyError::NotDraft => ApiError::Conflict {
                code: "POLICY_NOT_DRAFT",
                detail,
            },
            PolicyError::AlreadyFinalized => ApiError::Conflict {
                code: "ALREADY_FINALIZED",
                detail,
            },
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            StoreError::VersionConflict { .. } => ApiError::Conflict {
                code: "VERSION_CONFLICT",
                detail: err.to_string(),
            },
            StoreError::Conflict(detail) => ApiError::Conflict {
                code: "CONFLICT",
                detail,
            },
            StoreError::Unavailable(detail) => ApiError::Internal(detail),
        }
    }
}

impl From<AccessDenied> for ApiError {
    fn from(err: AccessDenied) -> Self {
        match err {
            // Information hiding across tenants
            AccessDenied::Hidden => ApiError::NotFound("resource not found".to_string()),
            AccessDenied::Forbidden(detail) => ApiError::Forbidden(detail),
        }
    }
}

impl From<VerificationError> for ApiError {
    fn from(err: VerificationError) -> Self {
        ApiError::Upstream(err.to_string())
    }
}

impl From<AnalyzerError> for ApiError {
    fn from(err: AnalyzerError) -> Self {
        ApiError::Upstream(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::validation(err.to_string())
    }
}
