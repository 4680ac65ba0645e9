//! Debug listing of the authorized users table.
//!
//! Returns full rows (tokens included), so access requires the
//! `x-admin-secret` header to match `ADMIN_SECRET`. With no secret configured
//! the route is closed.

use std::cmp::Ordering;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::{error, warn};

use saga_core::{Collection, Record};
use saga_infra::store::RecordStore;

use crate::app::errors::json_error;
use crate::context::AppState;
use crate::middleware::require_admin_secret;

/// GET /api/debug/authorized_users
pub async fn authorized_users(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(denied) = require_admin_secret(&state, &headers) {
        warn!("debug listing requested without a valid admin secret");
        return denied;
    }

    match state.store.select_all(&Collection::AUTHORIZED_USERS).await {
        Ok(mut rows) => {
            rows.sort_by(by_initials);
            Json(json!({ "data": rows })).into_response()
        }
        Err(e) => {
            error!(error = %e, "reading authorized users failed");
            json_error(StatusCode::BAD_GATEWAY, "store_fetch_failed", e.to_string())
        }
    }
}

/// Ascending by `initials`; rows without one go last.
fn by_initials(a: &Record, b: &Record) -> Ordering {
    match (initials(a), initials(b)) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn initials(row: &Record) -> Option<&str> {
    row.get("initials").and_then(Value::as_str)
}
