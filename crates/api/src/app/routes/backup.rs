//! The backup trigger.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tracing::{error, info};

use saga_core::iso_timestamp;
use saga_infra::jobs::BackupReport;

use crate::app::errors;
use crate::context::AppState;

pub const COMPLETED_MESSAGE: &str = "Nightly backup completed";

#[derive(Debug, Serialize)]
pub struct BackupResponse {
    pub message: &'static str,
    pub containers_count: usize,
    pub samples_count: usize,
    pub pruned_count: usize,
    pub timestamp: String,
}

impl From<BackupReport> for BackupResponse {
    fn from(report: BackupReport) -> Self {
        Self {
            message: COMPLETED_MESSAGE,
            containers_count: report.snapshot.containers_count,
            samples_count: report.snapshot.samples_count,
            pruned_count: report.pruned_count,
            timestamp: iso_timestamp(report.snapshot.captured_at),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/nightly-backup",
        post(run_backup).fallback(errors::post_only),
    )
}

/// POST /nightly-backup - run the job once, synchronously.
pub async fn run_backup(State(state): State<AppState>) -> Response {
    info!("backup triggered over http");
    match state.job.run().await {
        Ok(report) => (StatusCode::OK, Json(BackupResponse::from(report))).into_response(),
        Err(e) => {
            error!(step = e.step().as_str(), code = e.code(), error = %e, "triggered backup failed");
            errors::backup_error_to_response(&e)
        }
    }
}
