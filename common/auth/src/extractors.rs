use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderValue};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::claims::Claims;
use crate::error::{AuthError, AuthResult};
use crate::reader::JwtReader;

const BEARER_SCHEME: &str = "bearer";

/// Caller identity established from the request's bearer token.
///
/// Taking an `AuthContext` in a handler makes the route require a token the
/// shared [`JwtReader`] accepts; anything else is answered with the
/// corresponding [`AuthError`] response.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub claims: Claims,
    /// Expiry of the presented token.
    pub valid_to: DateTime<Utc>,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    Arc<JwtReader>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthorization)?;
        let token = bearer_token(header)?;

        let result = Arc::<JwtReader>::from_ref(state).read(token)?;
        let valid_to = result.valid_to;
        let claims = result.into_claims()?;

        debug!(subject = ?claims.subject, %valid_to, "authenticated request");
        Ok(Self { claims, valid_to })
    }
}

/// Token part of an `Authorization: Bearer <token>` header. The scheme name
/// is matched case-insensitively.
fn bearer_token(value: &HeaderValue) -> AuthResult<&str> {
    let raw = value
        .to_str()
        .map_err(|_| AuthError::InvalidAuthorization)?;

    let (scheme, token) = raw
        .trim()
        .split_once(' ')
        .ok_or(AuthError::InvalidAuthorization)?;
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return Err(AuthError::InvalidAuthorization);
    }

    match token.trim() {
        "" => Err(AuthError::InvalidAuthorization),
        token => Ok(token),
    }
}
