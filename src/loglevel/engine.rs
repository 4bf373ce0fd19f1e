//! Logging engine capability.
//!
//! # Responsibilities
//! - Expose the default and per-package levels the process is running with
//! - Accept level changes without a restart
//!
//! # Design Decisions
//! - The applier depends on the [`LogEngine`] trait, never on global statics
//! - [`TracingLogEngine`] drives a reloadable `EnvFilter`, one directive per package
//! - A package is a tracing target, so its native separator is `::`

use std::collections::BTreeMap;
use std::sync::Mutex;

use thiserror::Error;
use tracing_subscriber::{reload, EnvFilter, Registry};

use crate::loglevel::level::LogLevel;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("unknown package {0:?}")]
    UnknownPackage(String),

    #[error("{0:?} is not a valid logging target")]
    InvalidTarget(String),

    #[error("failed to reload log filter: {0}")]
    Reload(String),
}

/// Levels held by the process's logging engine.
pub trait LogEngine: Send + Sync {
    fn default_level(&self) -> LogLevel;

    fn set_default_level(&self, level: LogLevel) -> Result<(), EngineError>;

    /// Every package the engine currently holds a level for.
    fn package_names(&self) -> Vec<String>;

    fn package_level(&self, package: &str) -> Result<LogLevel, EngineError>;

    fn set_package_level(&self, package: &str, level: LogLevel) -> Result<(), EngineError>;

    /// Separator inside native package identifiers.
    fn package_separator(&self) -> &str {
        "/"
    }
}

#[derive(Debug, Clone)]
struct EngineState {
    default: LogLevel,
    packages: BTreeMap<String, LogLevel>,
}

impl EngineState {
    fn directives(&self) -> String {
        let mut out = self.default.to_filter().to_string();
        for (target, level) in &self.packages {
            out.push(',');
            out.push_str(target);
            out.push('=');
            out.push_str(&level.to_filter().to_string());
        }
        out
    }
}

/// [`LogEngine`] backed by the process's tracing subscriber.
pub struct TracingLogEngine {
    state: Mutex<EngineState>,
    handle: Option<reload::Handle<EnvFilter, Registry>>,
}

impl TracingLogEngine {
    pub fn new(handle: reload::Handle<EnvFilter, Registry>, default: LogLevel) -> Self {
        Self {
            state: Mutex::new(EngineState {
                default,
                packages: BTreeMap::new(),
            }),
            handle: Some(handle),
        }
    }

    /// An engine that tracks levels without a subscriber attached.
    pub fn detached(default: LogLevel) -> Self {
        Self {
            state: Mutex::new(EngineState {
                default,
                packages: BTreeMap::new(),
            }),
            handle: None,
        }
    }

    /// Filter directives currently in force, e.g. `info,my_crate::store=debug`.
    pub fn directives(&self) -> String {
        self.state.lock().expect("engine state poisoned").directives()
    }

    /// Initial filter carrying only a default level.
    pub fn filter_for_level(default: LogLevel) -> EnvFilter {
        EnvFilter::new(default.to_filter().to_string())
    }

    fn update<F>(&self, change: F) -> Result<(), EngineError>
    where
        F: FnOnce(&mut EngineState),
    {
        let mut state = self.state.lock().expect("engine state poisoned");
        let mut next = state.clone();
        change(&mut next);

        if let Some(handle) = &self.handle {
            let directives = next.directives();
            let filter = EnvFilter::try_new(&directives)
                .map_err(|e| EngineError::InvalidTarget(format!("{directives}: {e}")))?;
            handle
                .reload(filter)
                .map_err(|e| EngineError::Reload(e.to_string()))?;
        }

        *state = next;
        Ok(())
    }
}

fn validate_target(target: &str) -> Result<(), EngineError> {
    let valid = !target.is_empty()
        && !target.starts_with(':')
        && !target.ends_with(':')
        && target
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(EngineError::InvalidTarget(target.to_string()))
    }
}

impl LogEngine for TracingLogEngine {
    fn default_level(&self) -> LogLevel {
        self.state.lock().expect("engine state poisoned").default
    }

    fn set_default_level(&self, level: LogLevel) -> Result<(), EngineError> {
        self.update(|state| state.default = level)
    }

    fn package_names(&self) -> Vec<String> {
        let state = self.state.lock().expect("engine state poisoned");
        state.packages.keys().cloned().collect()
    }

    fn package_level(&self, package: &str) -> Result<LogLevel, EngineError> {
        let state = self.state.lock().expect("engine state poisoned");
        state
            .packages
            .get(package)
            .copied()
            .ok_or_else(|| EngineError::UnknownPackage(package.to_string()))
    }

    fn set_package_level(&self, package: &str, level: LogLevel) -> Result<(), EngineError> {
        validate_target(package)?;
        self.update(|state| {
            state.packages.insert(package.to_string(), level);
        })
    }

    fn package_separator(&self) -> &str {
        "::"
    }
}
