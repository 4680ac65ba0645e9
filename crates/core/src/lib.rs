//! `saga-core`: domain building blocks for the backup service.
//!
//! This crate contains **pure domain** primitives (no I/O, no HTTP, no store
//! client). Infrastructure lives in `saga-infra`.

pub mod clock;
pub mod error;
pub mod filter;
pub mod record;
pub mod retention;
pub mod snapshot;

pub use clock::{iso_timestamp, Clock, FixedClock, SystemClock};
pub use error::{DomainError, DomainResult};
pub use filter::{Filter, FilterOp};
pub use record::{Collection, Record};
pub use retention::RetentionPolicy;
pub use snapshot::{newest_first, Snapshot, SnapshotPayload, SnapshotSummary, StoredSnapshotInfo};
