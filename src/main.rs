//! # Toast Gateway Main Entry Point
//!
//! Runs the API server and, when enabled, the hourly menu sync scheduler
//! until Ctrl-C.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use toast_gateway::{
    config::ConfigLoader,
    db,
    scheduler::MenuSyncScheduler,
    server::{AppState, run_server},
    telemetry,
};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from layered env files and variables
    let config = ConfigLoader::new().load()?;
    telemetry::init_tracing(&config)?;

    info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        info!(config = %redacted_json, "Effective configuration");
    }

    let pool = db::init_pool(&config).await?;
    db::migrate(&pool).await?;

    let state = AppState::build(Arc::new(config), pool)?;
    let shutdown = CancellationToken::new();

    let scheduler_handle = if state.config.menu_sync.enabled {
        let scheduler = MenuSyncScheduler::new(
            state.integrations.clone(),
            Arc::clone(&state.menu_sync),
            state.config.menu_sync.interval(),
        );
        Some(tokio::spawn(scheduler.run(shutdown.child_token())))
    } else {
        warn!("Scheduled menu sync disabled");
        None
    };

    let ctrl_c_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                ctrl_c_token.cancel();
            }
            Err(err) => error!(error = %err, "Failed to listen for shutdown signal"),
        }
    });

    let served = run_server(state, shutdown.clone()).await;
    shutdown.cancel();

    if let Some(handle) = scheduler_handle
        && let Err(err) = handle.await
    {
        error!(error = %err, "Menu sync scheduler task failed");
    }

    served
}
