//! Configuration loading and representation.
//!
//! Everything is read from the process environment through a lookup
//! function, so tests can pass a map instead of mutating the real
//! environment.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

pub const SUPABASE_URL: &str = "SUPABASE_URL";
pub const SUPABASE_SERVICE_ROLE_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";
pub const SUPABASE_ANON_KEY: &str = "SUPABASE_ANON_KEY";
pub const ADMIN_SECRET: &str = "ADMIN_SECRET";
pub const STORE_TIMEOUT_SECS: &str = "SAGA_STORE_TIMEOUT_SECS";

const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: {message}")]
    Invalid { var: &'static str, message: String },
}

/// Environment lookup: `std::env::var` in production, a map in tests.
pub trait Lookup {
    fn get(&self, key: &str) -> Option<String>;
}

impl<F> Lookup for F
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        self(key)
    }
}

/// The real process environment.
#[derive(Debug, Copy, Clone, Default)]
pub struct ProcessEnv;

impl Lookup for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Non-empty, trimmed value of `key`, if any.
pub fn optional(env: &impl Lookup, key: &str) -> Option<String> {
    env.get(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn required(env: &impl Lookup, key: &'static str) -> Result<String, ConfigError> {
    optional(env, key).ok_or(ConfigError::Missing(key))
}

/// Connection settings for the hosted store.
///
/// Both values are required; a process without them must not start serving.
#[derive(Clone)]
pub struct StoreConfig {
    /// Project URL, without trailing slash (`https://<ref>.supabase.co`).
    pub url: String,
    /// Service-role key (bypasses row-level security).
    pub service_key: String,
    pub timeout: Duration,
}

impl StoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&ProcessEnv)
    }

    pub fn from_lookup(env: &impl Lookup) -> Result<Self, ConfigError> {
        let url = required(env, SUPABASE_URL)?;
        let service_key = required(env, SUPABASE_SERVICE_ROLE_KEY)?;

        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                var: SUPABASE_URL,
                message: format!("expected an http(s) URL, got {url:?}"),
            });
        }

        let timeout = match optional(env, STORE_TIMEOUT_SECS) {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| ConfigError::Invalid {
                    var: STORE_TIMEOUT_SECS,
                    message: format!("expected whole seconds, got {raw:?}"),
                })?;
                Duration::from_secs(secs)
            }
            None => DEFAULT_STORE_TIMEOUT,
        };

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            service_key,
            timeout,
        })
    }
}

impl core::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url)
            .field("service_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Presence (never values) of the variables operators most often forget.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnvPresence {
    #[serde(rename = "SUPABASE_URL")]
    pub supabase_url: bool,
    #[serde(rename = "SUPABASE_SERVICE_ROLE_KEY")]
    pub supabase_service_role_key: bool,
    #[serde(rename = "SUPABASE_ANON_KEY")]
    pub supabase_anon_key: bool,
    #[serde(rename = "ADMIN_SECRET")]
    pub admin_secret: bool,
}

impl EnvPresence {
    pub fn probe(env: &impl Lookup) -> Self {
        Self {
            supabase_url: optional(env, SUPABASE_URL).is_some(),
            supabase_service_role_key: optional(env, SUPABASE_SERVICE_ROLE_KEY).is_some(),
            supabase_anon_key: optional(env, SUPABASE_ANON_KEY).is_some(),
            admin_secret: optional(env, ADMIN_SECRET).is_some(),
        }
    }
}
