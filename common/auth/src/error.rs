use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

/// Hard failures. A well-formed token that simply fails validation is not an
/// error; it comes back as a rejected `ValidationResult`.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("malformed token: {0}")]
    MalformedToken(String),
    #[error("token verification failed: {0}")]
    Verification(String),
    #[error("token rejected")]
    Rejected,
    #[error("invalid signing key: {0}")]
    InvalidKey(String),
    #[error("authorization header missing")]
    MissingAuthorization,
    #[error("authorization header malformed")]
    InvalidAuthorization,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AuthError::MissingAuthorization | AuthError::InvalidAuthorization => {
                (StatusCode::UNAUTHORIZED, "AUTH_HEADER")
            }
            AuthError::MalformedToken(_) | AuthError::Verification(_) | AuthError::Rejected => {
                (StatusCode::UNAUTHORIZED, "AUTH_TOKEN")
            }
            AuthError::InvalidKey(_) => (StatusCode::INTERNAL_SERVER_ERROR, "AUTH_KEY"),
        };

        // Key problems are operator errors; keep the detail in the logs.
        let message = match &self {
            AuthError::InvalidKey(_) => "authentication is misconfigured".to_string(),
            other => other.to_string(),
        };

        let body = ErrorBody { code, message };
        (status, Json(body)).into_response()
    }
}
