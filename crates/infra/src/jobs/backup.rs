//! Nightly backup with rolling retention.
//!
//! ## Pipeline
//!
//! 1. read every `containers` record
//! 2. read every `samples` record
//! 3. compose a snapshot stamped with the current UTC time
//! 4. insert the snapshot into `backups`
//! 5. delete `backups` rows whose `created_at` is older than the retention window
//!
//! Steps run strictly in order and each waits for the previous one. A failure
//! in 1, 2 or 4 aborts the run before anything is deleted. A failure in 5 is
//! still reported as a failure, but the snapshot from step 4 stays in place.
//!
//! The two reads are independent calls, not a transaction: a concurrent
//! writer can land between them.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use saga_core::{Clock, Collection, RetentionPolicy, Snapshot, SnapshotSummary, SystemClock};

use crate::store::{RecordStore, StoreError};

/// Pipeline step, as reported in failures.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupStep {
    ReadContainers,
    ReadSamples,
    Persist,
    Retention,
}

impl BackupStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupStep::ReadContainers => "read_containers",
            BackupStep::ReadSamples => "read_samples",
            BackupStep::Persist => "persist",
            BackupStep::Retention => "retention",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackupError {
    /// A source collection could not be read. Nothing was written or deleted.
    #[error("failed to read {collection}: {source}")]
    SourceRead {
        collection: Collection,
        #[source]
        source: StoreError,
    },

    /// The snapshot insert was rejected. Nothing was written or deleted.
    #[error("failed to store snapshot: {source}")]
    Persist {
        #[source]
        source: StoreError,
    },

    /// The snapshot is stored, but expired snapshots could not be pruned.
    #[error("snapshot stored but pruning backups older than {cutoff} failed: {source}")]
    Retention {
        snapshot: SnapshotSummary,
        cutoff: DateTime<Utc>,
        #[source]
        source: StoreError,
    },
}

impl BackupError {
    pub fn step(&self) -> BackupStep {
        match self {
            BackupError::SourceRead { collection, .. } if *collection == Collection::SAMPLES => {
                BackupStep::ReadSamples
            }
            BackupError::SourceRead { .. } => BackupStep::ReadContainers,
            BackupError::Persist { .. } => BackupStep::Persist,
            BackupError::Retention { .. } => BackupStep::Retention,
        }
    }

    /// Stable machine-readable code for HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            BackupError::SourceRead { .. } => "source_read_failed",
            BackupError::Persist { .. } => "persist_failed",
            BackupError::Retention { .. } => "retention_failed",
        }
    }

    /// Whether a new snapshot exists despite the failure.
    pub fn snapshot_stored(&self) -> bool {
        matches!(self, BackupError::Retention { .. })
    }
}

/// Outcome of a fully successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackupReport {
    #[serde(flatten)]
    pub snapshot: SnapshotSummary,
    pub cutoff: DateTime<Utc>,
    pub pruned_count: usize,
}

/// The nightly backup job.
///
/// Holds no state between runs besides its collaborators; calling
/// [`run`](Self::run) twice simply produces two snapshots.
pub struct BackupJob<S> {
    store: S,
    retention: RetentionPolicy,
    clock: Arc<dyn Clock>,
}

impl<S: RecordStore> BackupJob<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            retention: RetentionPolicy::default(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = retention;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn retention(&self) -> RetentionPolicy {
        self.retention
    }

    pub async fn run(&self) -> Result<BackupReport, BackupError> {
        info!("starting nightly backup");

        let containers = self.read_source(Collection::CONTAINERS).await?;
        let samples = self.read_source(Collection::SAMPLES).await?;

        let snapshot = Snapshot::compose(containers, samples, self.clock.now());
        let summary = snapshot.summary();

        if let Err(source) = self
            .store
            .insert(&Collection::BACKUPS, vec![snapshot.to_record()])
            .await
        {
            error!(step = BackupStep::Persist.as_str(), error = %source, "snapshot insert failed");
            return Err(BackupError::Persist { source });
        }
        info!(
            containers = summary.containers_count,
            samples = summary.samples_count,
            "snapshot stored"
        );

        let now = self.clock.now();
        let cutoff = self.retention.cutoff(now);
        let pruned_count = match self
            .store
            .delete_where(&Collection::BACKUPS, &self.retention.sweep_filter(now))
            .await
        {
            Ok(n) => n,
            Err(source) => {
                warn!(
                    step = BackupStep::Retention.as_str(),
                    %cutoff,
                    error = %source,
                    "retention sweep failed; new snapshot kept"
                );
                return Err(BackupError::Retention {
                    snapshot: summary,
                    cutoff,
                    source,
                });
            }
        };

        info!(
            containers = summary.containers_count,
            samples = summary.samples_count,
            pruned = pruned_count,
            %cutoff,
            "nightly backup completed"
        );

        Ok(BackupReport {
            snapshot: summary,
            cutoff,
            pruned_count,
        })
    }

    async fn read_source(&self, collection: Collection) -> Result<Vec<saga_core::Record>, BackupError> {
        match self.store.select_all(&collection).await {
            Ok(rows) => {
                info!(%collection, rows = rows.len(), "source collection read");
                Ok(rows)
            }
            Err(source) => {
                error!(%collection, error = %source, "source read failed; aborting without changes");
                Err(BackupError::SourceRead { collection, source })
            }
        }
    }
}
