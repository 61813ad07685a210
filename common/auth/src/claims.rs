use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;

/// Application-focused representation of validated JWT claims.
///
/// Built from a payload that already passed validation, so it never fails:
/// optional claims with an unexpected shape are left out of the typed fields
/// and remain available through [`Claims::get`].
#[derive(Debug, Clone, Serialize)]
pub struct Claims {
    pub subject: Option<String>,
    pub issuer: String,
    pub audience: Vec<String>,
    pub roles: Vec<String>,
    pub expires_at: DateTime<Utc>,
    pub issued_at: Option<DateTime<Utc>>,
    pub not_before: Option<DateTime<Utc>>,
    pub raw: Value,
}

impl Claims {
    /// Look up any claim by name, including custom ones.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.raw.get(name)
    }
}

impl From<Value> for Claims {
    fn from(raw: Value) -> Self {
        let subject = raw.get("sub").and_then(scalar_string);
        let issuer = raw
            .get("iss")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let audience = raw.get("aud").map(strings).unwrap_or_default();

        let mut roles = raw.get("role").map(strings).unwrap_or_default();
        roles.extend(raw.get("roles").map(strings).unwrap_or_default());

        // exp beyond chrono's range still denotes "valid for the foreseeable future".
        let expires_at = raw
            .get("exp")
            .and_then(timestamp)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let issued_at = raw.get("iat").and_then(timestamp);
        let not_before = raw.get("nbf").and_then(timestamp);

        Self {
            subject,
            issuer,
            audience,
            roles,
            expires_at,
            issued_at,
            not_before,
            raw,
        }
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// A string claim or an array of them; non-string entries are skipped.
fn strings(value: &Value) -> Vec<String> {
    match value {
        Value::String(item) => vec![item.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_owned))
            .collect(),
        _ => Vec::new(),
    }
}

fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let seconds = match value.as_i64() {
        Some(seconds) => seconds,
        None => {
            let seconds = value.as_f64()?;
            if !seconds.is_finite() || seconds.abs() >= i64::MAX as f64 {
                return None;
            }
            seconds.trunc() as i64
        }
    };
    Utc.timestamp_opt(seconds, 0).single()
}
