//! Authentication
//!
//! Bearer tokens carry the user id, role, and organization scope. Token
//! issuance happens at login time by the identity collaborator; this module
//! only validates tokens and resolves them into an `Actor`.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use core_kernel::{CompanyId, HospitalId, UserId};
use domain_access::Actor;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: Uuid,
    /// Actor role: platform_admin, hospital_admin or insurance_admin
    pub role: String,
    /// Organization scope: the hospital or company the role is bound to
    pub org: Option<Uuid>,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Unknown role: {0}")]
    UnknownRole(String),
    #[error("Role {0} requires an organization scope")]
    MissingScope(String),
}

/// Creates a new JWT token
pub fn create_token(
    user_id: UserId,
    role: &str,
    org: Option<Uuid>,
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(expiration_secs as i64);

    let claims = Claims {
        sub: user_id.into(),
        role: role.to_string(),
        org,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Validates a JWT token
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        if e.to_string().contains("ExpiredSignature") {
            AuthError::TokenExpired
        } else {
            AuthError::InvalidToken
        }
    })?;

    Ok(token_data.claims)
}

/// Resolves validated claims into the actor context for this request
pub fn resolve_actor(claims: &Claims) -> Result<Actor, AuthError> {
    let user_id = UserId::from(claims.sub);
    match claims.role.as_str() {
        "platform_admin" => Ok(Actor::platform_admin(user_id)),
        "hospital_admin" => {
            let org = claims
                .org
                .ok_or_else(|| AuthError::MissingScope(claims.role.clone()))?;
            Ok(Actor::hospital_admin(user_id, HospitalId::from(org)))
        }
        "insurance_admin" => {
            let org = claims
                .org
                .ok_or_else(|| AuthError::MissingScope(claims.role.clone()))?;
            Ok(Actor::insurance_admin(user_id, CompanyId::from(org)))
        }
        other => Err(AuthError::UnknownRole(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_party::UserRole;

    #[test]
    fn token_round_trip_resolves_actor() {
        let user = UserId::new();
        let hospital = Uuid::new_v4();
        let token =
            create_token(user, "hospital_admin", Some(hospital), "secret", 3600).unwrap();

        let claims = validate_token(&token, "secret").unwrap();
        let actor = resolve_actor(&claims).unwrap();
        assert_eq!(actor.user_id, user);
        assert_eq!(actor.role, UserRole::HospitalAdmin);
        assert_eq!(actor.hospital_id, Some(HospitalId::from(hospital)));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = create_token(UserId::new(), "platform_admin", None, "secret", 3600).unwrap();
        assert!(matches!(
            validate_token(&token, "other"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn scoped_role_without_org_is_rejected() {
        let token = create_token(UserId::new(), "hospital_admin", None, "secret", 3600).unwrap();
        let claims = validate_token(&token, "secret").unwrap();
        assert!(matches!(
            resolve_actor(&claims),
            Err(AuthError::MissingScope(_))
        ));
    }
}
