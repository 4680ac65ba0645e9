use axum::{
    routing::{get, post},
    Router,
};

use crate::app::errors;
use crate::context::AppState;

pub mod backup;
pub mod backups;
pub mod debug;
pub mod relay;
pub mod system;

/// Router for everything under `/api`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cron", post(relay::relay).fallback(errors::post_only))
        .route("/_env_check", get(system::env_check).fallback(errors::get_only))
        .route("/backups", get(backups::list).fallback(errors::get_only))
        .route("/backups/latest", get(backups::latest).fallback(errors::get_only))
        .route(
            "/debug/authorized_users",
            get(debug::authorized_users).fallback(errors::get_only),
        )
}
