use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

/// JWT options bound from the `JwtOptions` configuration section.
///
/// Nothing is checked when the record is built; unusable key material is
/// reported by [`JwtConfig::signing_key`].
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct JwtConfig {
    /// Expected issuer claim (iss). The accepted audience is derived from it.
    pub issuer: String,
    /// Configured audience. Not consulted when validating tokens.
    pub audience: String,
    /// Shared secret, interpreted as ASCII bytes.
    pub key: String,
    /// Access token lifetime in minutes.
    pub access_token_lifetime: i64,
    /// Refresh token lifetime in minutes.
    pub refresh_token_lifetime: i64,
}

impl JwtConfig {
    pub fn new(issuer: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }

    /// Set both token lifetimes, in minutes.
    pub fn with_lifetimes(mut self, access_minutes: i64, refresh_minutes: i64) -> Self {
        self.access_token_lifetime = access_minutes;
        self.refresh_token_lifetime = refresh_minutes;
        self
    }

    /// Audience value a token must carry: the issuer prefixed with `*.`.
    ///
    /// Compared as a plain string, the `*` has no wildcard meaning.
    pub fn expected_audience(&self) -> String {
        format!("*.{}", self.issuer)
    }

    /// Raw bytes of the symmetric key.
    pub fn signing_key(&self) -> AuthResult<&[u8]> {
        if self.key.is_empty() {
            return Err(AuthError::InvalidKey("signing key is empty".to_string()));
        }
        if !self.key.is_ascii() {
            return Err(AuthError::InvalidKey(
                "signing key contains non-ASCII characters".to_string(),
            ));
        }
        Ok(self.key.as_bytes())
    }

    pub fn access_token_ttl(&self) -> Duration {
        Duration::minutes(self.access_token_lifetime)
    }

    pub fn refresh_token_ttl(&self) -> Duration {
        Duration::minutes(self.refresh_token_lifetime)
    }
}

// Keeps the secret out of logs.
impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("key", &"<redacted>")
            .field("access_token_lifetime", &self.access_token_lifetime)
            .field("refresh_token_lifetime", &self.refresh_token_lifetime)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signing_key_is_ascii_bytes() {
        let config = JwtConfig::new("auth.example", "supersecretkey123456");
        let key = config.signing_key().expect("key");
        assert_eq!(key, b"supersecretkey123456");
    }

    #[test]
    fn signing_key_rejects_empty_material() {
        let config = JwtConfig::new("auth.example", "");
        let err = config.signing_key().expect_err("empty key must fail");
        assert!(matches!(err, AuthError::InvalidKey(_)));
    }

    #[test]
    fn signing_key_rejects_non_ascii_material() {
        let config = JwtConfig::new("auth.example", "ключ-шифрования");
        let err = config.signing_key().expect_err("non-ascii key must fail");
        assert!(matches!(err, AuthError::InvalidKey(_)));
    }

    #[test]
    fn expected_audience_prefixes_issuer() {
        let config = JwtConfig::new("auth.example", "k");
        assert_eq!(config.expected_audience(), "*.auth.example");
    }

    #[test]
    fn binds_pascal_case_section_with_defaults() {
        let section = serde_json::json!({
            "Issuer": "auth.example",
            "Key": "supersecretkey123456",
            "AccessTokenLifetime": 15
        });
        let config: JwtConfig = serde_json::from_value(section).expect("bind");
        assert_eq!(config.issuer, "auth.example");
        assert_eq!(config.audience, "");
        assert_eq!(config.access_token_ttl(), Duration::minutes(15));
        assert_eq!(config.refresh_token_lifetime, 0);
    }

    #[test]
    fn debug_output_redacts_key() {
        let config = JwtConfig::new("auth.example", "supersecretkey123456");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("supersecretkey123456"));
        assert!(rendered.contains("auth.example"));
    }
}
