use std::collections::HashMap;
use std::sync::{Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use saga_core::{iso_timestamp, Collection, Filter, Record};
use saga_core::snapshot::STORED_AT_FIELD;

use super::r#trait::{RecordStore, StoreError};

/// Store operation kinds (used for scripted failures and the call log).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Select,
    Insert,
    Delete,
}

/// In-memory record store.
///
/// Intended for tests/dev. Mimics the server-side defaults of the hosted
/// tables: inserted objects get an `id` and a `created_at` when they do not
/// carry one.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    tables: RwLock<HashMap<Collection, Vec<Record>>>,
    faults: Mutex<HashMap<(StoreOp, Collection), String>>,
    calls: Mutex<Vec<(StoreOp, Collection)>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put records in place verbatim (no defaults applied).
    pub fn seed(&self, collection: &Collection, records: impl IntoIterator<Item = Record>) {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        tables
            .entry(collection.clone())
            .or_default()
            .extend(records);
    }

    pub fn records(&self, collection: &Collection) -> Vec<Record> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn count(&self, collection: &Collection) -> usize {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(collection)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Make every `op` against `collection` fail with `message` until
    /// [`clear_faults`](Self::clear_faults) is called.
    pub fn fail_on(&self, op: StoreOp, collection: &Collection, message: impl Into<String>) {
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((op, collection.clone()), message.into());
    }

    pub fn clear_faults(&self) {
        self.faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Every operation attempted so far, in call order (including failed ones).
    pub fn calls(&self) -> Vec<(StoreOp, Collection)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn enter(&self, op: StoreOp, collection: &Collection) -> Result<(), StoreError> {
        self.calls
            .lock()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?
            .push((op, collection.clone()));

        let faults = self
            .faults
            .lock()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        match faults.get(&(op, collection.clone())) {
            Some(message) => Err(StoreError::Unavailable(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn select_all(&self, collection: &Collection) -> Result<Vec<Record>, StoreError> {
        self.enter(StoreOp::Select, collection)?;
        let tables = self
            .tables
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        Ok(tables.get(collection).cloned().unwrap_or_default())
    }

    async fn insert(&self, collection: &Collection, records: Vec<Record>) -> Result<(), StoreError> {
        self.enter(StoreOp::Insert, collection)?;

        // Validate the whole batch before touching the table (all-or-nothing).
        let mut prepared = Vec::with_capacity(records.len());
        for (idx, record) in records.into_iter().enumerate() {
            let Value::Object(mut row) = record else {
                return Err(StoreError::Rejected(format!(
                    "record at index {idx} is not a JSON object"
                )));
            };
            row.entry("id")
                .or_insert_with(|| Value::String(Uuid::now_v7().to_string()));
            row.entry(STORED_AT_FIELD)
                .or_insert_with(|| Value::String(iso_timestamp(Utc::now())));
            prepared.push(Value::Object(row));
        }

        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        tables.entry(collection.clone()).or_default().extend(prepared);
        Ok(())
    }

    async fn delete_where(&self, collection: &Collection, filter: &Filter) -> Result<usize, StoreError> {
        self.enter(StoreOp::Delete, collection)?;
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        let Some(rows) = tables.get_mut(collection) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|r| !filter.matches(r));
        Ok(before - rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn insert_applies_server_defaults() {
        let store = InMemoryRecordStore::new();
        store
            .insert(&Collection::BACKUPS, vec![json!({"data": {}})])
            .await
            .unwrap();

        let rows = store.records(&Collection::BACKUPS);
        assert_eq!(rows.len(), 1);
        assert!(rows[0]["id"].is_string());
        assert!(rows[0]["created_at"].is_string());
    }

    #[tokio::test]
    async fn insert_keeps_caller_supplied_columns() {
        let store = InMemoryRecordStore::new();
        store
            .insert(
                &Collection::BACKUPS,
                vec![json!({"id": 7, "created_at": "2026-01-01T00:00:00.000Z"})],
            )
            .await
            .unwrap();

        let rows = store.records(&Collection::BACKUPS);
        assert_eq!(rows[0]["id"], json!(7));
        assert_eq!(rows[0]["created_at"], json!("2026-01-01T00:00:00.000Z"));
    }

    #[tokio::test]
    async fn rejected_batch_stores_nothing() {
        let store = InMemoryRecordStore::new();
        let err = store
            .insert(&Collection::BACKUPS, vec![json!({"ok": true}), json!("scalar")])
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Rejected(_)));
        assert_eq!(store.count(&Collection::BACKUPS), 0);
    }

    #[tokio::test]
    async fn delete_reports_removed_count() {
        let store = InMemoryRecordStore::new();
        store.seed(
            &Collection::BACKUPS,
            vec![
                json!({"created_at": "2026-01-01T00:00:00.000Z"}),
                json!({"created_at": "2026-01-02T00:00:00.000Z"}),
                json!({"created_at": "2026-01-09T00:00:00.000Z"}),
            ],
        );

        let removed = store
            .delete_where(
                &Collection::BACKUPS,
                &Filter::lt("created_at", "2026-01-05T00:00:00.000Z"),
            )
            .await
            .unwrap();

        assert_eq!(removed, 2);
        assert_eq!(store.count(&Collection::BACKUPS), 1);
    }

    #[tokio::test]
    async fn delete_on_unknown_collection_is_a_no_op() {
        let store = InMemoryRecordStore::new();
        let removed = store
            .delete_where(&Collection::BACKUPS, &Filter::eq("id", 1))
            .await
            .unwrap();
        assert_eq!(removed, 0);
    }

    #[tokio::test]
    async fn scripted_faults_are_scoped_to_op_and_collection() {
        let store = InMemoryRecordStore::new();
        store.seed(&Collection::CONTAINERS, vec![json!({"id": 1})]);
        store.fail_on(StoreOp::Select, &Collection::SAMPLES, "relation \"samples\" does not exist");

        assert_eq!(store.select_all(&Collection::CONTAINERS).await.unwrap().len(), 1);
        assert_eq!(
            store.select_all(&Collection::SAMPLES).await.unwrap_err(),
            StoreError::Unavailable("relation \"samples\" does not exist".to_string())
        );

        store.clear_faults();
        assert!(store.select_all(&Collection::SAMPLES).await.unwrap().is_empty());
        assert_eq!(
            store.calls(),
            vec![
                (StoreOp::Select, Collection::CONTAINERS),
                (StoreOp::Select, Collection::SAMPLES),
                (StoreOp::Select, Collection::SAMPLES),
            ]
        );
    }
}
