//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Startup configuration problems.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

/// Database pool settings.
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Session token settings.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub secret: String,
    pub ttl_hours: i64,
    pub issuer: String,
    /// Mark the session cookie `Secure` (HTTPS only).
    pub cookie_secure: bool,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseSettings>,
    pub admin_username: String,
    /// PHC hash, or a plain password hashed at startup.
    pub admin_password: String,
    /// Base32 pre-shared TOTP secret.
    pub totp_secret: String,
    pub session: SessionSettings,
    pub storage_timeout: Duration,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's value if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let database = match get("DATABASE_URL") {
            Some(url) => Some(DatabaseSettings {
                url,
                max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", 20)?,
                min_connections: parse_or(&get, "DB_MIN_CONNECTIONS", 2)?,
            }),
            None => None,
        };

        let admin_password = get("ADMIN_PASSWORD_HASH")
            .or_else(|| get("ADMIN_PASSWORD"))
            .ok_or(ConfigError::Missing("ADMIN_PASSWORD_HASH or ADMIN_PASSWORD"))?;

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&get, "PORT", 8080)?,
            database,
            admin_username: required("ADMIN_USERNAME")?,
            admin_password,
            totp_secret: required("TOTP_SECRET")?,
            session: SessionSettings {
                secret: required("SESSION_SECRET")?,
                ttl_hours: parse_or(&get, "SESSION_TTL_HOURS", 24)?,
                issuer: get("SESSION_ISSUER").unwrap_or_else(|| "quill".to_string()),
                cookie_secure: parse_or(&get, "COOKIE_SECURE", false)?,
            },
            storage_timeout: Duration::from_secs(parse_or(&get, "STORAGE_TIMEOUT_SECS", 10)?),
        })
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            key,
            value: raw,
        }),
        None => Ok(default),
    }
}
