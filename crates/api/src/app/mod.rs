//! HTTP API application wiring (Axum router + state).
//!
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `errors.rs`: consistent error responses

use axum::{routing::get, Router};
use tower::ServiceBuilder;

use crate::context::AppState;
use crate::middleware;

pub mod errors;
pub mod routes;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(state: AppState) -> Router {
    let trigger = routes::backup::router().route_layer(axum::middleware::from_fn_with_state(
        state.clone(),
        middleware::cron_secret_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(trigger)
        .nest("/api", routes::router())
        .layer(ServiceBuilder::new())
        .with_state(state)
}
