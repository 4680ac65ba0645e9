//! POST /api/cron - forward a trigger call and hand the answer back unchanged.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{error, info};

use crate::app::errors::json_error;
use crate::context::AppState;

/// The caller's `Authorization` header travels with the call; the relay adds
/// no credentials of its own, so a guarded trigger stays guarded.
pub async fn relay(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let target = &state.relay;
    let mut request = target.client.post(&target.url);
    if let Some(auth) = headers.get(header::AUTHORIZATION) {
        request = request.header(header::AUTHORIZATION, auth.clone());
    }

    let upstream = match request.send().await {
        Ok(resp) => resp,
        Err(e) => {
            error!(url = %target.url, error = %e, "relay could not reach the trigger");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "relay_failed", e.to_string());
        }
    };

    let status = upstream.status();
    let content_type = upstream.headers().get(header::CONTENT_TYPE).cloned();
    let body = match upstream.bytes().await {
        Ok(body) => body,
        Err(e) => {
            error!(url = %target.url, %status, error = %e, "relay lost the trigger response");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "relay_failed", e.to_string());
        }
    };
    info!(url = %target.url, %status, "relayed trigger call");

    let mut resp = (status, body).into_response();
    if let Some(content_type) = content_type {
        resp.headers_mut().insert(header::CONTENT_TYPE, content_type);
    }
    resp
}
