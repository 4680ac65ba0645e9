use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;

use saga_api::config::AppConfig;
use saga_api::context::{AppState, SharedStore};
use saga_core::SystemClock;
use saga_infra::jobs::spawn_daily;
use saga_infra::store::PostgrestStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    saga_observability::init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration; refusing to start");
            return Err(e.into());
        }
    };

    let store: SharedStore =
        Arc::new(PostgrestStore::new(&config.store).context("failed to build store client")?);
    let state = AppState::from_config(&config, store).context("failed to build relay client")?;

    let runner = config.daily_at.map(|schedule| {
        tracing::info!(?schedule, "in-process daily backup enabled");
        spawn_daily(state.job.clone(), schedule, Arc::new(SystemClock))
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        store = %config.store.url,
        trigger = %config.trigger_url,
        cron_secret = config.cron_secret.is_some(),
        "listening"
    );

    axum::serve(listener, saga_api::app::build_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(runner) = runner {
        runner.shutdown().await;
    }
    tracing::info!("stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "could not install ctrl-c handler");
        std::future::pending::<()>().await;
    }
}
