use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::Value;
use tracing::{debug, warn};

use crate::claims::Claims;
use crate::config::JwtConfig;
use crate::error::{AuthError, AuthResult};

/// Outcome of checking a well-formed token against the configured policy.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub valid: bool,
    pub claims: Option<Claims>,
    /// Token expiry; `DateTime::<Utc>::MIN_UTC` when the token was rejected.
    pub valid_to: DateTime<Utc>,
}

impl ValidationResult {
    fn accepted(claims: Claims) -> Self {
        Self {
            valid: true,
            valid_to: claims.expires_at,
            claims: Some(claims),
        }
    }

    pub fn rejected() -> Self {
        Self {
            valid: false,
            claims: None,
            valid_to: DateTime::<Utc>::MIN_UTC,
        }
    }

    /// Claims of an accepted token, or `AuthError::Rejected`.
    pub fn into_claims(self) -> AuthResult<Claims> {
        match self.claims {
            Some(claims) if self.valid => Ok(claims),
            _ => Err(AuthError::Rejected),
        }
    }
}

/// Validates bearer tokens signed with the configured symmetric key.
///
/// Expected failures (bad signature, wrong issuer or audience, expired) come
/// back as a rejected [`ValidationResult`]. Input that is not a token at all
/// is an `Err`, as is unusable key material.
#[derive(Clone)]
pub struct JwtReader {
    config: Arc<JwtConfig>,
    validation: Validation,
}

impl JwtReader {
    pub fn new(config: impl Into<Arc<JwtConfig>>) -> Self {
        let config = config.into();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.expected_audience()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);

        Self { config, validation }
    }

    pub fn config(&self) -> &JwtConfig {
        &self.config
    }

    pub fn read(&self, token: &str) -> AuthResult<ValidationResult> {
        let key = DecodingKey::from_secret(self.config.signing_key()?);

        match decode::<Value>(token, &key, &self.validation) {
            Ok(data) => {
                let claims = Claims::from(data.claims);
                debug!(
                    issuer = %claims.issuer,
                    valid_to = %claims.expires_at,
                    "validated JWT successfully"
                );
                Ok(ValidationResult::accepted(claims))
            }
            Err(err) if is_rejection(&err) => {
                warn!(error = ?err, issuer = %self.config.issuer, "JWT validation failed");
                Ok(ValidationResult::rejected())
            }
            Err(err) => Err(classify_failure(err)),
        }
    }
}

/// Failures of a structurally sound token against the policy.
fn is_rejection(err: &JwtError) -> bool {
    matches!(
        err.kind(),
        ErrorKind::InvalidSignature
            | ErrorKind::ExpiredSignature
            | ErrorKind::ImmatureSignature
            | ErrorKind::InvalidIssuer
            | ErrorKind::InvalidAudience
            | ErrorKind::InvalidSubject
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::MissingRequiredClaim(_)
    )
}

fn classify_failure(err: JwtError) -> AuthError {
    match err.kind() {
        ErrorKind::InvalidToken
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_)
        | ErrorKind::InvalidAlgorithmName => AuthError::MalformedToken(err.to_string()),
        _ => AuthError::Verification(err.to_string()),
    }
}
