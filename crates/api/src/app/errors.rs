use axum::http::{header, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use serde_json::json;

use saga_infra::jobs::BackupError;

/// Every failed run is a 500; the body names the failed step.
pub fn backup_error_to_response(err: &BackupError) -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        axum::Json(json!({
            "error": err.code(),
            "step": err.step(),
            "message": err.to_string(),
            "snapshot_stored": err.snapshot_stored(),
        })),
    )
        .into_response()
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn method_not_allowed(allow: &'static str) -> axum::response::Response {
    let mut resp = json_error(
        StatusCode::METHOD_NOT_ALLOWED,
        "method_not_allowed",
        format!("only {allow} is supported"),
    );
    resp.headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static(allow));
    resp
}

/// Fallback for POST-only routes.
pub async fn post_only() -> axum::response::Response {
    method_not_allowed("POST")
}

/// Fallback for GET-only routes.
pub async fn get_only() -> axum::response::Response {
    method_not_allowed("GET")
}
