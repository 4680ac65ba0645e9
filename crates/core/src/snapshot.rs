//! Snapshot model: one backup row holding full copies of the source
//! collections.
//!
//! Wire shape of a `backups` row:
//!
//! ```json
//! {
//!   "data": { "containers": [...], "samples": [...], "timestamp": "2026-10-17T08:00:00.000Z" },
//!   "created_at": "2026-10-17T08:00:00.000Z",
//!   "created_by": "system"
//! }
//! ```
//!
//! `data.timestamp` is the capture time; `created_at` is the storage time the
//! retention sweep compares against. They are separate columns even when a
//! run writes the same instant to both.

use core::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::clock::iso_timestamp;
use crate::record::Record;

/// Column compared by the retention sweep.
pub const STORED_AT_FIELD: &str = "created_at";

/// Author recorded on snapshots taken by the scheduled job.
pub const SYSTEM_AUTHOR: &str = "system";

/// Payload stored in the `data` column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPayload {
    pub containers: Vec<Record>,
    pub samples: Vec<Record>,
    #[serde(rename = "timestamp", with = "iso_millis")]
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub data: SnapshotPayload,
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

/// Counts reported back to the invoker once a snapshot exists.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotSummary {
    pub containers_count: usize,
    pub samples_count: usize,
    pub captured_at: DateTime<Utc>,
}

impl Snapshot {
    /// Assemble a snapshot from already-read source collections. Empty
    /// collections stay empty arrays.
    pub fn compose(containers: Vec<Record>, samples: Vec<Record>, now: DateTime<Utc>) -> Self {
        Self {
            data: SnapshotPayload {
                containers,
                samples,
                captured_at: now,
            },
            created_at: now,
            created_by: SYSTEM_AUTHOR.to_string(),
        }
    }

    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            containers_count: self.data.containers.len(),
            samples_count: self.data.samples.len(),
            captured_at: self.data.captured_at,
        }
    }

    /// Row to insert into the `backups` collection.
    pub fn to_record(&self) -> Record {
        json!({
            "data": {
                "containers": self.data.containers,
                "samples": self.data.samples,
                "timestamp": iso_timestamp(self.data.captured_at),
            },
            "created_at": iso_timestamp(self.created_at),
            "created_by": self.created_by,
        })
    }
}

/// One stored `backups` row as listed to operators: identity, timestamps and
/// source counts, without the payload itself.
///
/// Built leniently from whatever the store returns; rows written by other
/// tools may lack columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredSnapshotInfo {
    pub id: Value,
    pub created_at: Option<String>,
    pub created_by: Option<String>,
    pub timestamp: Option<String>,
    pub containers_count: usize,
    pub samples_count: usize,
}

impl StoredSnapshotInfo {
    pub fn from_record(row: &Record) -> Self {
        let text = |v: Option<&Value>| v.and_then(Value::as_str).map(str::to_string);
        let data = row.get("data");
        let count = |key: &str| {
            data.and_then(|d| d.get(key))
                .and_then(Value::as_array)
                .map_or(0, Vec::len)
        };
        Self {
            id: row.get("id").cloned().unwrap_or(Value::Null),
            created_at: text(row.get(STORED_AT_FIELD)),
            created_by: text(row.get("created_by")),
            timestamp: text(data.and_then(|d| d.get("timestamp"))),
            containers_count: count("containers"),
            samples_count: count("samples"),
        }
    }
}

/// Order `backups` rows by `created_at`, newest first. Rows without a
/// readable `created_at` sort last.
pub fn newest_first(a: &Record, b: &Record) -> Ordering {
    match (stored_at(a), stored_at(b)) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn stored_at(row: &Record) -> Option<DateTime<Utc>> {
    let raw = row.get(STORED_AT_FIELD)?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

mod iso_millis {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&crate::clock::iso_timestamp(*at))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 8, 0, 0).unwrap()
    }

    #[test]
    fn record_shape_matches_backups_table() {
        let snapshot = Snapshot::compose(vec![json!({"id": 1})], vec![], now());
        assert_eq!(
            snapshot.to_record(),
            json!({
                "data": {
                    "containers": [{"id": 1}],
                    "samples": [],
                    "timestamp": "2026-10-17T08:00:00.000Z",
                },
                "created_at": "2026-10-17T08:00:00.000Z",
                "created_by": "system",
            })
        );
    }

    #[test]
    fn stored_row_reads_back_as_snapshot() {
        let snapshot = Snapshot::compose(vec![json!({"id": 1})], vec![json!({"id": "s"})], now());
        let mut row = snapshot.to_record();
        // store-assigned columns are ignored
        row["id"] = json!(42);

        let parsed: Snapshot = serde_json::from_value(row).unwrap();
        assert_eq!(parsed, snapshot);
    }

    #[test]
    fn listing_info_reads_counts_and_tolerates_missing_columns() {
        let mut row = Snapshot::compose(vec![json!({}), json!({})], vec![json!({})], now()).to_record();
        row["id"] = json!("b-1");

        assert_eq!(
            StoredSnapshotInfo::from_record(&row),
            StoredSnapshotInfo {
                id: json!("b-1"),
                created_at: Some("2026-10-17T08:00:00.000Z".to_string()),
                created_by: Some("system".to_string()),
                timestamp: Some("2026-10-17T08:00:00.000Z".to_string()),
                containers_count: 2,
                samples_count: 1,
            }
        );

        let bare = StoredSnapshotInfo::from_record(&json!({ "id": 3 }));
        assert_eq!(bare.created_at, None);
        assert_eq!(bare.containers_count, 0);
    }

    #[test]
    fn newest_first_compares_instants_not_text() {
        let mut rows = vec![
            json!({ "id": 1, "created_at": "2026-10-15T08:00:00.000Z" }),
            json!({ "id": 2 }),
            // sorts after id 1 as text, but is the earlier instant
            json!({ "id": 3, "created_at": "2026-10-15T09:00:00+02:00" }),
            json!({ "id": 4, "created_at": "2026-10-17T08:00:00.000Z" }),
        ];
        rows.sort_by(newest_first);

        let ids: Vec<_> = rows.iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!(4), json!(1), json!(3), json!(2)]);
    }

    #[test]
    fn summary_counts_source_rows() {
        let snapshot = Snapshot::compose(vec![json!({}), json!({})], vec![json!({})], now());
        assert_eq!(
            snapshot.summary(),
            SnapshotSummary {
                containers_count: 2,
                samples_count: 1,
                captured_at: now(),
            }
        );
    }
}
