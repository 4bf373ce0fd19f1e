//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Keep the level filter reloadable so the store can drive it
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, text format for development
//! - The returned TracingLogEngine is the only way levels change after startup

use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

use crate::config::schema::{LogFormat, ObservabilityConfig};
use crate::loglevel::engine::{EngineError, LogEngine, TracingLogEngine};
use crate::loglevel::level::{InvalidLevel, LogLevel};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error(transparent)]
    InvalidLevel(#[from] InvalidLevel),

    #[error("failed to install tracing subscriber: {0}")]
    Init(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Install the global subscriber and return the engine controlling it.
pub fn init_logging(config: &ObservabilityConfig) -> Result<TracingLogEngine, LoggingError> {
    let default: LogLevel = config.log_level.parse()?;
    let (filter, handle) = reload::Layer::new(TracingLogEngine::filter_for_level(default));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.log_format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Text => registry.with(fmt::layer()).try_init(),
    };
    installed.map_err(|e| LoggingError::Init(e.to_string()))?;

    let engine = TracingLogEngine::new(handle, default);
    for package in &config.packages {
        engine.set_package_level(package, default)?;
    }
    Ok(engine)
}
