//! # Menu Sync Scheduler
//!
//! Background task that periodically syncs the menu of every tenant with the
//! Toast integration enabled and scheduled sync switched on. Tenants are
//! processed strictly one after another; a failure (or panic) in one tenant is
//! logged and the loop moves on.

use std::sync::Arc;

use metrics::{gauge, histogram};
use serde::Serialize;
use tokio::time::{Duration, Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::menu_sync::MenuSyncEngine;
use crate::repositories::IntegrationRepository;

/// Background scheduler service.
pub struct MenuSyncScheduler {
    integrations: IntegrationRepository,
    engine: Arc<MenuSyncEngine>,
    interval: Duration,
}

/// Totals for one scheduled pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncRunSummary {
    pub tenants_processed: u32,
    pub succeeded: u32,
    pub failed: u32,
}

impl MenuSyncScheduler {
    pub fn new(
        integrations: IntegrationRepository,
        engine: Arc<MenuSyncEngine>,
        interval: Duration,
    ) -> Self {
        Self {
            integrations,
            engine,
            interval,
        }
    }

    /// Run the scheduler loop until the provided shutdown token fires.
    #[instrument(skip_all)]
    pub async fn run(self, shutdown: CancellationToken) {
        info!(interval_secs = self.interval.as_secs(), "Starting menu sync scheduler");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Menu sync scheduler shutdown requested");
                    break;
                }
                _ = sleep(self.interval) => {
                    let tick_started = Instant::now();
                    if let Err(err) = self.scheduled_menu_sync().await {
                        error!(error = ?err, "Scheduled menu sync pass failed");
                    }
                    histogram!("toast_scheduled_sync_tick_duration_ms")
                        .record(tick_started.elapsed().as_secs_f64() * 1_000.0);
                }
            }
        }

        info!("Menu sync scheduler stopped");
    }

    /// Sync every eligible tenant once.
    ///
    /// Only loading the tenant list can fail the pass; per-tenant failures are
    /// counted in the summary.
    pub async fn scheduled_menu_sync(&self) -> anyhow::Result<SyncRunSummary> {
        let tenants = self.integrations.list_scheduled_menu_sync().await?;
        gauge!("toast_scheduled_sync_tenants_gauge").set(tenants.len() as f64);

        let mut summary = SyncRunSummary::default();

        for integration in tenants {
            let tenant_id = integration.tenant_id;
            let engine = Arc::clone(&self.engine);
            summary.tenants_processed += 1;

            // Spawned so a panic stays inside this tenant; awaited immediately.
            let handle =
                tokio::spawn(async move { engine.sync_menu_from_vendor(tenant_id).await });

            match handle.await {
                Ok(report) if report.success => summary.succeeded += 1,
                Ok(report) => {
                    summary.failed += 1;
                    warn!(
                        tenant_id = %tenant_id,
                        error = report.error.as_deref().unwrap_or("unknown"),
                        "Scheduled menu sync failed for tenant"
                    );
                }
                Err(join_err) => {
                    summary.failed += 1;
                    error!(tenant_id = %tenant_id, error = %join_err, "Menu sync task aborted");
                }
            }
        }

        debug!(
            processed = summary.tenants_processed,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Scheduled menu sync pass completed"
        );

        Ok(summary)
    }
}
