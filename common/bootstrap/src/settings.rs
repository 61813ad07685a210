use std::env;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use common_auth::JwtConfig;
use serde::Deserialize;

const DEFAULT_SETTINGS_FILE: &str = "appsettings.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "Development",
            Environment::Production => "Production",
        }
    }
}

/// Process-wide settings, loaded once at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AppSettings {
    pub environment: Environment,
    pub host: String,
    pub port: u16,
    #[serde(rename = "JwtOptions")]
    pub jwt: JwtConfig,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt: JwtConfig::default(),
        }
    }
}

impl AppSettings {
    /// Read the settings file (`APP_SETTINGS_PATH`, or `appsettings.json` when
    /// present) and apply environment overrides on top.
    pub fn load() -> Result<Self> {
        let path = match env::var("APP_SETTINGS_PATH") {
            Ok(value) => normalize_optional(&value).map(PathBuf::from),
            Err(_) => {
                let fallback = PathBuf::from(DEFAULT_SETTINGS_FILE);
                fallback.exists().then_some(fallback)
            }
        };

        let mut settings = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        settings.apply_overrides(|key| env::var(key).ok())?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("Invalid settings file {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Failed to parse settings JSON")
    }

    /// Apply overrides from a variable source, normally the process environment.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).and_then(|value| normalize_optional(&value));

        if let Some(value) = var("APP_ENV") {
            self.environment = parse_environment(&value)?;
        }
        if let Some(value) = var("HOST") {
            self.host = value;
        }
        if let Some(value) = var("PORT") {
            self.port = value
                .parse()
                .with_context(|| format!("Failed to parse PORT '{value}'"))?;
        }
        if let Some(value) = var("JWT_ISSUER") {
            self.jwt.issuer = value;
        }
        if let Some(value) = var("JWT_AUDIENCE") {
            self.jwt.audience = value;
        }
        if let Some(value) = var("JWT_KEY") {
            self.jwt.key = value;
        }
        if let Some(value) = var("JWT_ACCESS_TOKEN_LIFETIME") {
            self.jwt.access_token_lifetime = value
                .parse()
                .with_context(|| format!("Failed to parse JWT_ACCESS_TOKEN_LIFETIME '{value}'"))?;
        }
        if let Some(value) = var("JWT_REFRESH_TOKEN_LIFETIME") {
            self.jwt.refresh_token_lifetime = value
                .parse()
                .with_context(|| format!("Failed to parse JWT_REFRESH_TOKEN_LIFETIME '{value}'"))?;
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .with_context(|| format!("Invalid HOST '{}'", self.host))?;
        Ok(SocketAddr::from((ip, self.port)))
    }
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_environment(value: &str) -> Result<Environment> {
    match value.trim().to_ascii_lowercase().as_str() {
        "development" | "dev" => Ok(Environment::Development),
        "production" | "prod" => Ok(Environment::Production),
        other => Err(anyhow!(
            "Unsupported environment '{other}'. Use Development or Production."
        )),
    }
}
