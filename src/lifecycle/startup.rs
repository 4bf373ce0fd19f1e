//! Startup orchestration.
//!
//! # Responsibilities
//! - Preload the store from configured seed entries
//! - Build the log controller from a validated config
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Seeding goes through ComponentConfig so keys use the one codec

use std::sync::Arc;

use thiserror::Error;

use crate::config::schema::SyncConfig;
use crate::kvconfig::keys::MalformedKeyError;
use crate::kvconfig::manager::ConfigManager;
use crate::kvconfig::store::{KvStore, StoreError};
use crate::loglevel::applier::LevelApplier;
use crate::loglevel::controller::LogController;
use crate::loglevel::engine::LogEngine;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Key(#[from] MalformedKeyError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub fn config_manager(config: &SyncConfig, store: Arc<dyn KvStore>) -> ConfigManager {
    ConfigManager::new(store, config.store.data_prefix.clone())
        .with_watch_buffer(config.store.watch_buffer)
}

/// Write every `[[store.seed]]` entry. Returns how many were written.
pub async fn seed_store(
    config: &SyncConfig,
    manager: &ConfigManager,
) -> Result<usize, StartupError> {
    for seed in &config.store.seed {
        let handle = manager.component_config(&seed.component, seed.config_type)?;
        handle.save(&seed.key, &seed.value).await?;
        tracing::debug!(
            component = %seed.component,
            config_type = %seed.config_type,
            key = %seed.key,
            "Seeded store entry"
        );
    }
    Ok(config.store.seed.len())
}

pub fn build_controller(
    config: &SyncConfig,
    manager: ConfigManager,
    engine: Arc<dyn LogEngine>,
) -> Result<LogController, StartupError> {
    let controller = LogController::new(
        manager,
        &config.component.label,
        &config.component.global_label,
        LevelApplier::new(engine),
        config.controller.clone(),
    )?;
    Ok(controller)
}
