use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use saga_core::{Collection, Filter, Record};

/// Record store operation error.
///
/// These are **infrastructure errors** (transport, HTTP status, decoding).
/// The message is what ends up in the job's failure report, so adapters
/// should keep the store's own wording where they have it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Transport(String),

    #[error("store responded with HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unexpected store response: {0}")]
    Decode(String),

    #[error("store rejected records: {0}")]
    Rejected(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Generic, collection-scoped data access.
///
/// ## Contract
///
/// - `select_all`: every record of the collection, unfiltered and unpaged
///   from the caller's point of view. Adapters that page internally must
///   keep going until the collection is exhausted.
/// - `insert`: all records are stored or none are (single request).
/// - `delete_where`: removes every record matching the filter and reports
///   how many were removed.
///
/// Calls are independent: no transaction spans two calls.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn select_all(&self, collection: &Collection) -> Result<Vec<Record>, StoreError>;

    async fn insert(&self, collection: &Collection, records: Vec<Record>) -> Result<(), StoreError>;

    async fn delete_where(&self, collection: &Collection, filter: &Filter) -> Result<usize, StoreError>;
}

#[async_trait]
impl<S> RecordStore for Arc<S>
where
    S: RecordStore + ?Sized,
{
    async fn select_all(&self, collection: &Collection) -> Result<Vec<Record>, StoreError> {
        (**self).select_all(collection).await
    }

    async fn insert(&self, collection: &Collection, records: Vec<Record>) -> Result<(), StoreError> {
        (**self).insert(collection, records).await
    }

    async fn delete_where(&self, collection: &Collection, filter: &Filter) -> Result<usize, StoreError> {
        (**self).delete_where(collection, filter).await
    }
}
