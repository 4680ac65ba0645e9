use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::context::AppState;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// GET /api/_env_check - presence of the important variables, never values.
pub async fn env_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "ok": true,
        "present": state.env_presence,
    }))
}
