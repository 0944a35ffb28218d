// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT issuing, verification, and the access gate middleware.

use crate::error::AppError;
use crate::models::Role;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Token lifetime. There is no refresh; expiry forces a new login.
pub const TOKEN_TTL_SECS: u64 = 60 * 60;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (account id, or "admin")
    pub sub: String,
    pub role: Role,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at (Unix timestamp)
    pub iat: u64,
}

/// Authenticated subject extracted from JWT.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub subject_id: String,
    pub role: Role,
}

impl AuthUser {
    /// Reject unless the subject holds one of `roles`.
    pub fn require_role(&self, roles: &[Role]) -> Result<(), AppError> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            tracing::debug!(
                subject = %self.subject_id,
                role = %self.role,
                required = ?roles,
                "Role not permitted"
            );
            Err(AppError::Forbidden)
        }
    }
}

/// Why the access gate turned a request away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("missing bearer token")]
    NoToken,
    #[error("invalid token")]
    InvalidToken,
    #[error("role not permitted")]
    Forbidden,
}

impl From<AccessError> for AppError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::NoToken => AppError::Unauthorized,
            AccessError::InvalidToken => AppError::InvalidToken,
            AccessError::Forbidden => AppError::Forbidden,
        }
    }
}

fn unix_now() -> anyhow::Result<u64> {
    use std::time::{SystemTime, UNIX_EPOCH};
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

/// Create a JWT for a subject, valid for [`TOKEN_TTL_SECS`].
pub fn create_jwt(subject_id: &str, role: Role, signing_key: &[u8]) -> anyhow::Result<String> {
    create_jwt_at(subject_id, role, signing_key, unix_now()?)
}

/// Create a JWT as if issued at `issued_at` (Unix seconds).
pub fn create_jwt_at(
    subject_id: &str,
    role: Role,
    signing_key: &[u8],
    issued_at: u64,
) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let claims = Claims {
        sub: subject_id.to_string(),
        role,
        iat: issued_at,
        exp: issued_at + TOKEN_TTL_SECS,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Verify a token's signature and expiry. Fails closed.
pub fn verify_jwt(token: &str, signing_key: &[u8]) -> Result<AuthUser, AccessError> {
    let key = DecodingKey::from_secret(signing_key);
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let token_data =
        decode::<Claims>(token, &key, &validation).map_err(|_| AccessError::InvalidToken)?;

    if token_data.claims.sub.is_empty() {
        return Err(AccessError::InvalidToken);
    }

    Ok(AuthUser {
        subject_id: token_data.claims.sub,
        role: token_data.claims.role,
    })
}

/// Extract the bearer token from an `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// The access gate: verify the bearer token and, when `required_roles` is
/// given, check the embedded role against it.
pub fn authorize(
    headers: &HeaderMap,
    signing_key: &[u8],
    required_roles: Option<&[Role]>,
) -> Result<AuthUser, AccessError> {
    let token = bearer_token(headers).ok_or(AccessError::NoToken)?;
    let user = verify_jwt(token, signing_key)?;

    match required_roles {
        Some(roles) if !roles.contains(&user.role) => Err(AccessError::Forbidden),
        _ => Ok(user),
    }
}

/// Middleware that requires valid JWT authentication.
///
/// Attaches [`AuthUser`] to the request; handlers enforce their roles.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_user = authorize(request.headers(), &state.config.jwt_signing_key, None)
        .map_err(|err| {
            tracing::debug!(reason = %err, path = %request.uri().path(), "Rejected request");
            AppError::from(err)
        })?;

    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}
