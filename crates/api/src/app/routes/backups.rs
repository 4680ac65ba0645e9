//! Read side of the `backups` collection for operators: a newest-first
//! listing of stored snapshots and the latest snapshot in full.
//!
//! Both routes expose captured lab data, so they sit behind the same
//! `x-admin-secret` gate as the debug listing.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use saga_core::{newest_first, Collection, Record, StoredSnapshotInfo};
use saga_infra::store::{RecordStore, StoreError};

use crate::app::errors::json_error;
use crate::context::AppState;
use crate::middleware::require_admin_secret;

/// Most rows one listing returns.
pub const MAX_LISTED: usize = 50;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    limit: Option<usize>,
}

impl ListParams {
    fn limit(&self) -> usize {
        self.limit.unwrap_or(MAX_LISTED).clamp(1, MAX_LISTED)
    }
}

/// GET /api/backups
pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Response {
    if let Err(denied) = require_admin_secret(&state, &headers) {
        warn!("backup listing requested without a valid admin secret");
        return denied;
    }

    match newest_backups(&state).await {
        Ok(rows) => {
            let data: Vec<StoredSnapshotInfo> = rows
                .iter()
                .take(params.limit())
                .map(StoredSnapshotInfo::from_record)
                .collect();
            Json(json!({ "data": data })).into_response()
        }
        Err(e) => store_failure(e),
    }
}

/// GET /api/backups/latest
pub async fn latest(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(denied) = require_admin_secret(&state, &headers) {
        warn!("latest backup requested without a valid admin secret");
        return denied;
    }

    match newest_backups(&state).await {
        Ok(rows) => match rows.into_iter().next() {
            Some(row) => Json(json!({ "data": row })).into_response(),
            None => json_error(StatusCode::NOT_FOUND, "backup_not_found", "no backups stored yet"),
        },
        Err(e) => store_failure(e),
    }
}

// The collection holds at most a retention window of daily rows, so it is
// read whole and ordered here.
async fn newest_backups(state: &AppState) -> Result<Vec<Record>, StoreError> {
    let mut rows = state.store.select_all(&Collection::BACKUPS).await?;
    rows.sort_by(newest_first);
    Ok(rows)
}

fn store_failure(e: StoreError) -> Response {
    error!(error = %e, "reading backups failed");
    json_error(StatusCode::BAD_GATEWAY, "store_fetch_failed", e.to_string())
}
