//! Log level sync daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────────────── configuration store ────────────────────────┐
//!   │  <prefix>global/loglevel/*            <prefix><component>/loglevel/*  │
//!   └───────────────┬──────────────────────────────────┬──────────────────┘
//!                   │ watch                            │ watch
//!                   ▼                                  ▼
//!          ┌─────────────────┐                ┌─────────────────┐
//!          │ ChangeTranslator│                │ ChangeTranslator│
//!          └────────┬────────┘                └────────┬────────┘
//!                   └──────────────┬───────────────────┘
//!                                  ▼
//!                        ┌───────────────────┐
//!                        │   LogController   │  list_all both subtrees
//!                        │ reconcile → gate  │
//!                        └─────────┬─────────┘
//!                                  ▼
//!                        ┌───────────────────┐
//!                        │   LevelApplier    │
//!                        └─────────┬─────────┘
//!                                  ▼
//!                        ┌───────────────────┐
//!                        │ TracingLogEngine  │  reloadable EnvFilter
//!                        └───────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use log_config_sync::config::loader::{load_config, COMPONENT_ENV};
use log_config_sync::kvconfig::MemoryStore;
use log_config_sync::lifecycle::{signals, startup, Shutdown};
use log_config_sync::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "log-config-sync")]
#[command(about = "Applies log levels published in the configuration store", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Label of this component.
    #[arg(long, env = COMPONENT_ENV)]
    component: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref(), cli.component.as_deref())?;

    let engine = Arc::new(logging::init_logging(&config.observability)?);

    tracing::info!(
        component = %config.component.label,
        data_prefix = %config.store.data_prefix,
        remove_policy = ?config.controller.remove_policy,
        "log-config-sync v0.1.0 starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let store = MemoryStore::new();
    let manager = startup::config_manager(&config, Arc::new(store));
    let seeded = startup::seed_store(&config, &manager).await?;
    tracing::info!(entries = seeded, "Store seeded");

    let controller = startup::build_controller(&config, manager, engine)?;
    let active = controller.active_levels();

    let shutdown = Shutdown::new();
    let task = tokio::spawn(controller.run(shutdown.subscribe()));

    signals::wait_for_signal().await;
    shutdown.trigger();
    task.await?;

    tracing::info!(levels = ?active.load_full(), "Shutdown complete");
    Ok(())
}
