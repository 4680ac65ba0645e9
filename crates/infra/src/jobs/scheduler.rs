//! Optional in-process daily trigger for the backup job.
//!
//! The primary trigger is external (scheduler → relay → `POST
//! /nightly-backup`). This runner exists for deployments without an external
//! cron: it fires once a day at a fixed UTC wall-clock time. A failed run is
//! logged and not retried; the next attempt is the next day.

use core::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use saga_core::Clock;

use super::backup::BackupJob;
use crate::config::ConfigError;
use crate::store::RecordStore;

pub const BACKUP_DAILY_AT: &str = "BACKUP_DAILY_AT";

/// A daily `HH:MM` in UTC.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DailySchedule {
    at: NaiveTime,
}

impl DailySchedule {
    pub fn new(at: NaiveTime) -> Self {
        Self { at }
    }

    /// First occurrence strictly after `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.date_naive().and_time(self.at).and_utc();
        if today > now {
            today
        } else {
            today + Duration::days(1)
        }
    }
}

impl FromStr for DailySchedule {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s.trim(), "%H:%M")
            .map(Self::new)
            .map_err(|_| ConfigError::Invalid {
                var: BACKUP_DAILY_AT,
                message: format!("expected HH:MM (UTC), got {s:?}"),
            })
    }
}

/// Handle to a running daily runner.
#[derive(Debug)]
pub struct DailyRunnerHandle {
    shutdown: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl DailyRunnerHandle {
    /// Stop waiting for the next occurrence. A run already in progress is
    /// allowed to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.join.await;
    }
}

/// Spawn the daily runner on the current tokio runtime.
pub fn spawn_daily<S>(
    job: Arc<BackupJob<S>>,
    schedule: DailySchedule,
    clock: Arc<dyn Clock>,
) -> DailyRunnerHandle
where
    S: RecordStore + 'static,
{
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let join = tokio::spawn(async move {
        info!(at = %schedule.at, "daily backup runner started");
        let mut last_slot: Option<DateTime<Utc>> = None;
        loop {
            let now = clock.now();
            // never fire the same slot twice, even if the clock lags behind it
            let from = last_slot.map_or(now, |slot| slot.max(now));
            let next = schedule.next_after(from);
            let wait = (next - now).to_std().unwrap_or_default();
            info!(next_run = %next, "next scheduled backup");

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                    continue;
                }
            }

            last_slot = Some(next);
            match job.run().await {
                Ok(report) => info!(
                    containers = report.snapshot.containers_count,
                    samples = report.snapshot.samples_count,
                    pruned = report.pruned_count,
                    "scheduled backup completed"
                ),
                Err(e) if e.snapshot_stored() => {
                    warn!(step = e.step().as_str(), error = %e, "scheduled backup stored but not pruned")
                }
                Err(e) => error!(step = e.step().as_str(), error = %e, "scheduled backup failed"),
            }
        }
        info!("daily backup runner stopped");
    });

    DailyRunnerHandle {
        shutdown: shutdown_tx,
        join,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use saga_core::{Collection, FixedClock};

    use crate::store::InMemoryRecordStore;

    #[test]
    fn parses_hh_mm() {
        let schedule: DailySchedule = "08:00".parse().unwrap();
        assert_eq!(schedule, DailySchedule::new(NaiveTime::from_hms_opt(8, 0, 0).unwrap()));
        assert!(matches!(
            "8am".parse::<DailySchedule>(),
            Err(ConfigError::Invalid { var: BACKUP_DAILY_AT, .. })
        ));
        assert!("25:00".parse::<DailySchedule>().is_err());
    }

    #[test]
    fn next_occurrence_is_later_today_or_tomorrow() {
        let schedule: DailySchedule = "08:00".parse().unwrap();
        let early = Utc.with_ymd_and_hms(2026, 10, 17, 7, 59, 0).unwrap();
        let exact = Utc.with_ymd_and_hms(2026, 10, 17, 8, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2026, 10, 17, 23, 0, 0).unwrap();

        assert_eq!(schedule.next_after(early), exact);
        assert_eq!(
            schedule.next_after(exact),
            Utc.with_ymd_and_hms(2026, 10, 18, 8, 0, 0).unwrap()
        );
        assert_eq!(
            schedule.next_after(late),
            Utc.with_ymd_and_hms(2026, 10, 18, 8, 0, 0).unwrap()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn runs_the_job_when_the_time_comes() {
        let store = Arc::new(InMemoryRecordStore::new());
        let clock: Arc<dyn Clock> =
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 10, 17, 7, 59, 0).unwrap()));
        let job = Arc::new(BackupJob::new(store.clone()).with_clock(clock.clone()));

        let handle = spawn_daily(job, "08:00".parse().unwrap(), clock);

        // one minute of (paused) time lets the first run happen; the clock
        // never moves, so the next slot must still be tomorrow's
        tokio::time::sleep(std::time::Duration::from_secs(61)).await;
        assert_eq!(store.count(&Collection::BACKUPS), 1);
        tokio::time::sleep(std::time::Duration::from_secs(3_600)).await;
        assert_eq!(store.count(&Collection::BACKUPS), 1);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_before_first_run_writes_nothing() {
        let store = Arc::new(InMemoryRecordStore::new());
        let clock: Arc<dyn Clock> =
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 10, 17, 9, 0, 0).unwrap()));
        let job = Arc::new(BackupJob::new(store.clone()).with_clock(clock.clone()));

        let handle = spawn_daily(job, "08:00".parse().unwrap(), clock);
        handle.shutdown().await;

        assert_eq!(store.count(&Collection::BACKUPS), 0);
    }
}
