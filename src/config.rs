//! Environment configuration for the bridge and the client binaries.
//!
//! Every loader has a `from_lookup` form taking a variable-lookup closure so
//! tests can supply a map instead of mutating the process environment.

use std::str::FromStr;

use crate::store::locale::Locale;

pub const DEFAULT_PORT: u16 = 5178;
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5176";
pub const DEFAULT_IDENTITY_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";
pub const DEFAULT_IDENTITY_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";
pub const DEFAULT_BRIDGE_URL: &str = "http://localhost:5178";
pub const DEFAULT_SESSION_TTL_SECS: i64 = 60 * 60 * 24 * 5;
pub const DEFAULT_RECENT_SIGN_IN_SECS: i64 = 5 * 60;
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 600;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env var {var}")]
    Missing { var: &'static str },
    #[error("invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

// =============================================================================
// HELPERS
// =============================================================================

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn required<F>(lookup: &F, var: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing { var })
}

fn parsed<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { var, value: raw }),
    }
}

fn url_or<F>(lookup: &F, var: &'static str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .unwrap_or_else(|| default.to_owned())
        .trim()
        .trim_end_matches('/')
        .to_owned()
}

// =============================================================================
// SHARED SECTIONS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityConfig {
    pub api_key: String,
    pub base_url: String,
    pub token_url: String,
}

impl IdentityConfig {
    /// Required: `IDENTITY_API_KEY`. Optional: `IDENTITY_BASE_URL`, `IDENTITY_TOKEN_URL`.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing.
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            api_key: required(lookup, "IDENTITY_API_KEY")?,
            base_url: url_or(lookup, "IDENTITY_BASE_URL", DEFAULT_IDENTITY_BASE_URL),
            token_url: url_or(lookup, "IDENTITY_TOKEN_URL", DEFAULT_IDENTITY_TOKEN_URL),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub base_url: String,
    /// Sent as the identity header on bridge-side profile lookups.
    pub service_token: Option<String>,
}

impl BackendConfig {
    /// Required: `BACKEND_BASE_URL`. Optional: `BACKEND_SERVICE_TOKEN`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is missing.
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = required(lookup, "BACKEND_BASE_URL")?.trim_end_matches('/').to_owned();
        let service_token = lookup("BACKEND_SERVICE_TOKEN").filter(|t| !t.trim().is_empty());
        Ok(Self { base_url, service_token })
    }
}

// =============================================================================
// BRIDGE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub port: u16,
    pub cors_origin: String,
    /// `None` selects the in-memory session store.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub cookie_secure: bool,
    pub session_ttl: time::Duration,
    pub recent_sign_in: time::Duration,
    pub sweep_interval: std::time::Duration,
    pub identity: IdentityConfig,
    pub backend: BackendConfig,
}

impl BridgeConfig {
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value fails to parse.
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let production = lookup("APP_ENV").is_some_and(|env| env.trim().eq_ignore_ascii_case("production"));
        let cookie_secure = lookup("COOKIE_SECURE")
            .as_deref()
            .and_then(parse_bool)
            .unwrap_or(production);

        let ttl_secs: i64 = parsed(lookup, "SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?;
        if ttl_secs <= 0 {
            return Err(ConfigError::Invalid { var: "SESSION_TTL_SECS", value: ttl_secs.to_string() });
        }

        let recent_secs: i64 = parsed(lookup, "SESSION_RECENT_SIGN_IN_SECS", DEFAULT_RECENT_SIGN_IN_SECS)?;
        if recent_secs <= 0 {
            return Err(ConfigError::Invalid { var: "SESSION_RECENT_SIGN_IN_SECS", value: recent_secs.to_string() });
        }

        let sweep_secs: u64 = parsed(lookup, "SESSION_SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS)?;
        if sweep_secs == 0 {
            return Err(ConfigError::Invalid { var: "SESSION_SWEEP_INTERVAL_SECS", value: "0".into() });
        }

        Ok(Self {
            port: parsed(lookup, "PORT", DEFAULT_PORT)?,
            cors_origin: url_or(lookup, "CORS_ORIGIN", DEFAULT_CORS_ORIGIN),
            database_url: lookup("DATABASE_URL").filter(|u| !u.trim().is_empty()),
            db_max_connections: parsed(lookup, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
            cookie_secure,
            session_ttl: time::Duration::seconds(ttl_secs),
            recent_sign_in: time::Duration::seconds(recent_secs),
            sweep_interval: std::time::Duration::from_secs(sweep_secs),
            identity: IdentityConfig::from_lookup(lookup)?,
            backend: BackendConfig::from_lookup(lookup)?,
        })
    }
}

// =============================================================================
// CLIENT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub bridge_url: String,
    pub locale: Locale,
    pub identity: IdentityConfig,
    pub backend: BackendConfig,
}

impl ClientConfig {
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|key| std::env::var(key).ok())
    }

    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value fails to parse.
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            bridge_url: url_or(lookup, "SESSION_BRIDGE_URL", DEFAULT_BRIDGE_URL),
            locale: parsed(lookup, "TEA_ID_LOCALE", Locale::default())?,
            identity: IdentityConfig::from_lookup(lookup)?,
            backend: BackendConfig::from_lookup(lookup)?,
        })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
