//! Operator CLI for one-off Toast sync and push runs against the configured database.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use toast_gateway::{
    config::ConfigLoader, db, scheduler::MenuSyncScheduler, server::AppState, telemetry,
};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "toast-gateway-cli", version, about = "Toast gateway operator tasks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one scheduled menu sync pass over every eligible tenant
    SyncAll,
    /// Sync the menu of a single tenant
    SyncMenu {
        #[arg(long)]
        tenant: Uuid,
    },
    /// Push a single order to Toast
    PushOrder {
        #[arg(long)]
        tenant: Uuid,
        #[arg(long)]
        order: Uuid,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::new().load().context("loading configuration")?;
    telemetry::init_tracing(&config).context("initializing tracing")?;

    let pool = db::init_pool(&config)
        .await
        .context("initializing database connection pool")?;
    db::migrate(&pool).await.context("applying migrations")?;

    let state = AppState::build(Arc::new(config), pool).context("wiring services")?;

    let output = match cli.command {
        Command::SyncAll => {
            let scheduler = MenuSyncScheduler::new(
                state.integrations.clone(),
                Arc::clone(&state.menu_sync),
                state.config.menu_sync.interval(),
            );
            let summary = scheduler
                .scheduled_menu_sync()
                .await
                .context("running scheduled menu sync")?;
            serde_json::to_string_pretty(&summary)?
        }
        Command::SyncMenu { tenant } => {
            let report = state.menu_sync.sync_menu_from_vendor(tenant).await;
            serde_json::to_string_pretty(&report)?
        }
        Command::PushOrder { tenant, order } => {
            let outcome = state
                .order_push
                .push_order(tenant, order)
                .await
                .with_context(|| format!("pushing order {}", order))?;
            serde_json::to_string_pretty(&outcome)?
        }
    };

    println!("{}", output);
    Ok(())
}
