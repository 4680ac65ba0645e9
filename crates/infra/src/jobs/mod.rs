//! Scheduled work: the nightly backup job and its optional in-process trigger.

pub mod backup;
pub mod scheduler;

pub use backup::{BackupError, BackupJob, BackupReport, BackupStep};
pub use scheduler::{spawn_daily, DailyRunnerHandle, DailySchedule, BACKUP_DAILY_AT};
