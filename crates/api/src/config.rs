//! Process configuration for the API binary.

use saga_infra::config::{
    optional, ConfigError, EnvPresence, Lookup, ProcessEnv, StoreConfig, ADMIN_SECRET,
};
use saga_infra::jobs::{DailySchedule, BACKUP_DAILY_AT};

pub const PORT: &str = "PORT";
pub const CRON_SECRET: &str = "CRON_SECRET";
pub const BACKUP_TRIGGER_URL: &str = "BACKUP_TRIGGER_URL";

pub const DEFAULT_PORT: u16 = 3001;

pub struct AppConfig {
    pub store: StoreConfig,
    pub port: u16,
    /// Guards `/api/debug/*`. Debug routes answer 401 when unset.
    pub admin_secret: Option<String>,
    /// When set, `POST /nightly-backup` requires `Authorization: Bearer <secret>`.
    pub cron_secret: Option<String>,
    /// Where the relay forwards to. Defaults to this process's own trigger.
    pub trigger_url: String,
    pub daily_at: Option<DailySchedule>,
    pub env_presence: EnvPresence,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&ProcessEnv)
    }

    pub fn from_lookup(env: &impl Lookup) -> Result<Self, ConfigError> {
        let store = StoreConfig::from_lookup(env)?;

        let port = match optional(env, PORT) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                var: PORT,
                message: format!("expected a port number, got {raw:?}"),
            })?,
            None => DEFAULT_PORT,
        };

        let trigger_url = optional(env, BACKUP_TRIGGER_URL)
            .unwrap_or_else(|| format!("http://127.0.0.1:{port}/nightly-backup"));

        let daily_at = optional(env, BACKUP_DAILY_AT)
            .map(|raw| raw.parse::<DailySchedule>())
            .transpose()?;

        Ok(Self {
            store,
            port,
            admin_secret: optional(env, ADMIN_SECRET),
            cron_secret: optional(env, CRON_SECRET),
            trigger_url,
            daily_at,
            env_presence: EnvPresence::probe(env),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use saga_infra::config::{SUPABASE_SERVICE_ROLE_KEY, SUPABASE_URL};

    fn env(pairs: &[(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k: &str| map.get(k).cloned()
    }

    const BASE: [(&str, &str); 2] = [
        (SUPABASE_URL, "https://abc.supabase.co"),
        (SUPABASE_SERVICE_ROLE_KEY, "service-key"),
    ];

    #[test]
    fn defaults() {
        let cfg = AppConfig::from_lookup(&env(&BASE)).unwrap();

        assert_eq!(cfg.port, 3001);
        assert_eq!(cfg.trigger_url, "http://127.0.0.1:3001/nightly-backup");
        assert!(cfg.admin_secret.is_none());
        assert!(cfg.cron_secret.is_none());
        assert!(cfg.daily_at.is_none());
        assert!(cfg.env_presence.supabase_url);
        assert!(!cfg.env_presence.admin_secret);
    }

    #[test]
    fn trigger_url_follows_port_unless_overridden() {
        let mut pairs = BASE.to_vec();
        pairs.push((PORT, "8080"));
        let cfg = AppConfig::from_lookup(&env(&pairs)).unwrap();
        assert_eq!(cfg.trigger_url, "http://127.0.0.1:8080/nightly-backup");

        pairs.push((BACKUP_TRIGGER_URL, "https://abc.supabase.co/functions/v1/nightly-backup"));
        let cfg = AppConfig::from_lookup(&env(&pairs)).unwrap();
        assert_eq!(cfg.trigger_url, "https://abc.supabase.co/functions/v1/nightly-backup");
    }

    #[test]
    fn missing_store_credentials_stop_startup() {
        assert_eq!(
            AppConfig::from_lookup(&env(&[(SUPABASE_URL, "https://abc.supabase.co")])).err(),
            Some(ConfigError::Missing(SUPABASE_SERVICE_ROLE_KEY))
        );
    }

    #[test]
    fn invalid_optional_values_are_rejected() {
        let mut pairs = BASE.to_vec();
        pairs.push((PORT, "http"));
        assert!(matches!(
            AppConfig::from_lookup(&env(&pairs)),
            Err(ConfigError::Invalid { var: PORT, .. })
        ));

        let mut pairs = BASE.to_vec();
        pairs.push((BACKUP_DAILY_AT, "3am"));
        assert!(matches!(
            AppConfig::from_lookup(&env(&pairs)),
            Err(ConfigError::Invalid { var: BACKUP_DAILY_AT, .. })
        ));
    }

    #[test]
    fn secrets_and_schedule_are_picked_up() {
        let mut pairs = BASE.to_vec();
        pairs.extend([
            (ADMIN_SECRET, "admin"),
            (CRON_SECRET, "cron"),
            (BACKUP_DAILY_AT, "08:00"),
        ]);
        let cfg = AppConfig::from_lookup(&env(&pairs)).unwrap();

        assert_eq!(cfg.admin_secret.as_deref(), Some("admin"));
        assert_eq!(cfg.cron_secret.as_deref(), Some("cron"));
        assert_eq!(cfg.daily_at, Some("08:00".parse().unwrap()));
        assert!(cfg.env_presence.admin_secret);
    }
}
