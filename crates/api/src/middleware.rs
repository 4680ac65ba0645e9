use axum::{
    extract::State,
    http::{HeaderMap, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::app::errors::json_error;
use crate::context::AppState;

/// Require `Authorization: Bearer <CRON_SECRET>` on the trigger when a secret
/// is configured. Non-POST requests pass through untouched so the route's
/// 405 answer is not masked by a 401.
pub async fn cron_secret_middleware(
    State(state): State<AppState>,
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let Some(expected) = state.cron_secret.as_deref() else {
        return next.run(req).await;
    };
    if req.method() != Method::POST {
        return next.run(req).await;
    }

    let authorized = matches!(extract_bearer(req.headers()), Ok(token) if token == expected);
    if !authorized {
        warn!(path = %req.uri().path(), "trigger called without a valid cron secret");
        return json_error(StatusCode::UNAUTHORIZED, "unauthorized", "missing or invalid cron secret");
    }

    next.run(req).await
}

pub const ADMIN_SECRET_HEADER: &str = "x-admin-secret";

/// Gate for the operator read endpoints: `x-admin-secret` must equal
/// `ADMIN_SECRET`. With no secret configured every request is refused.
pub fn require_admin_secret(state: &AppState, headers: &HeaderMap) -> Result<(), Response> {
    let provided = headers
        .get(ADMIN_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());
    match (state.admin_secret.as_deref(), provided) {
        (Some(expected), Some(provided)) if expected == provided => Ok(()),
        _ => Err(json_error(
            StatusCode::UNAUTHORIZED,
            "missing_admin_secret",
            "admin secret required",
        )),
    }
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, StatusCode> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let header = header.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(token)
}
