//! Shared request state.

use std::sync::Arc;
use std::time::Duration;

use saga_infra::config::EnvPresence;
use saga_infra::jobs::BackupJob;
use saga_infra::store::RecordStore;

use crate::config::AppConfig;

/// The triggering call can last as long as a full backup run.
pub const RELAY_TIMEOUT: Duration = Duration::from_secs(300);

pub type SharedStore = Arc<dyn RecordStore>;

/// Outbound target of `POST /api/cron`.
#[derive(Clone)]
pub struct RelayTarget {
    pub client: reqwest::Client,
    pub url: String,
}

impl RelayTarget {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub job: Arc<BackupJob<SharedStore>>,
    pub store: SharedStore,
    pub relay: RelayTarget,
    pub admin_secret: Option<Arc<str>>,
    pub cron_secret: Option<Arc<str>>,
    pub env_presence: EnvPresence,
}

impl AppState {
    /// State with a default job (7-day retention, system clock) and no secrets.
    pub fn new(store: SharedStore, relay: RelayTarget) -> Self {
        Self {
            job: Arc::new(BackupJob::new(store.clone())),
            store,
            relay,
            admin_secret: None,
            cron_secret: None,
            env_presence: EnvPresence::default(),
        }
    }

    pub fn from_config(config: &AppConfig, store: SharedStore) -> Result<Self, reqwest::Error> {
        let relay = RelayTarget::new(config.trigger_url.clone(), RELAY_TIMEOUT)?;
        Ok(Self::new(store, relay)
            .with_admin_secret(config.admin_secret.as_deref())
            .with_cron_secret(config.cron_secret.as_deref())
            .with_env_presence(config.env_presence))
    }

    pub fn with_job(mut self, job: BackupJob<SharedStore>) -> Self {
        self.job = Arc::new(job);
        self
    }

    pub fn with_admin_secret(mut self, secret: Option<&str>) -> Self {
        self.admin_secret = secret.map(Arc::from);
        self
    }

    pub fn with_cron_secret(mut self, secret: Option<&str>) -> Self {
        self.cron_secret = secret.map(Arc::from);
        self
    }

    pub fn with_env_presence(mut self, presence: EnvPresence) -> Self {
        self.env_presence = presence;
        self
    }
}
