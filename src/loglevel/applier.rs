//! Pushing effective levels into the logging engine.
//!
//! Package names are stored key-safe: the engine's separator is replaced by
//! `#` so a package path never adds segments to a store key.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::loglevel::engine::{EngineError, LogEngine};
use crate::loglevel::level::{InvalidLevel, LevelMap, LogLevel, DEFAULT_KEY};
use crate::loglevel::reconcile::reconcile;
use crate::observability::metrics;

/// Stands in for the engine's package separator inside store keys.
pub const KEY_SAFE_SEPARATOR: &str = "#";

pub fn to_native(key: &str, separator: &str) -> String {
    key.replace(KEY_SAFE_SEPARATOR, separator)
}

pub fn to_key_safe(package: &str, separator: &str) -> String {
    package.replace(separator, KEY_SAFE_SEPARATOR)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureCause {
    #[error(transparent)]
    InvalidLevel(#[from] InvalidLevel),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// One entry that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyFailure {
    pub key: String,
    pub cause: FailureCause,
}

impl fmt::Display for ApplyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.cause)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error("applied {applied} levels, {} failed", failures.len())]
    Partial {
        applied: usize,
        failures: Vec<ApplyFailure>,
    },
}

/// Applies effective level maps to a [`LogEngine`].
#[derive(Clone)]
pub struct LevelApplier {
    engine: Arc<dyn LogEngine>,
}

impl LevelApplier {
    pub fn new(engine: Arc<dyn LogEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<dyn LogEngine> {
        &self.engine
    }

    /// Levels the engine is running with, keyed the way the store keys them.
    pub fn active_levels(&self) -> LevelMap {
        let separator = self.engine.package_separator();
        let mut active = LevelMap::new();
        active.insert(DEFAULT_KEY.to_string(), self.engine.default_level().to_string());

        for package in self.engine.package_names() {
            match self.engine.package_level(&package) {
                Ok(level) => {
                    active.insert(to_key_safe(&package, separator), level.to_string());
                }
                Err(e) => tracing::warn!(
                    package = %package,
                    error = %e,
                    "Skipping unreadable package level"
                ),
            }
        }
        active
    }

    /// Apply `effective` on top of the engine's active levels.
    ///
    /// Packages the engine knows but `effective` does not name fall back to
    /// the effective `default`. Every entry is attempted even when others fail.
    /// Returns the number of entries applied.
    pub fn apply(&self, effective: &LevelMap) -> Result<usize, ApplyError> {
        let merged = reconcile(&self.active_levels(), effective);
        let ordered: BTreeMap<&String, &String> = merged.iter().collect();
        let separator = self.engine.package_separator();

        let mut applied = 0;
        let mut failures = Vec::new();
        for (key, level) in ordered {
            match self.apply_one(key, level, separator) {
                Ok(()) => applied += 1,
                Err(cause) => {
                    tracing::warn!(
                        key = %key,
                        level = %level,
                        error = %cause,
                        "Failed to apply log level"
                    );
                    metrics::record_apply_failure();
                    failures.push(ApplyFailure {
                        key: key.clone(),
                        cause,
                    });
                }
            }
        }

        if failures.is_empty() {
            Ok(applied)
        } else {
            Err(ApplyError::Partial { applied, failures })
        }
    }

    fn apply_one(&self, key: &str, level: &str, separator: &str) -> Result<(), FailureCause> {
        let level: LogLevel = level.parse()?;
        if key == DEFAULT_KEY {
            self.engine.set_default_level(level)?;
        } else {
            self.engine.set_package_level(&to_native(key, separator), level)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loglevel::engine::TracingLogEngine;

    fn map(pairs: &[(&str, &str)]) -> LevelMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_separator_translation() {
        assert_eq!(to_native("app#store#watch", "::"), "app::store::watch");
        assert_eq!(to_native("github.com#org#pkg", "/"), "github.com/org/pkg");
        assert_eq!(to_key_safe("app::store", "::"), "app#store");
        assert_eq!(to_native("plain", "::"), "plain");
    }

    #[test]
    fn test_apply_sets_default_and_packages() {
        let engine = Arc::new(TracingLogEngine::detached(LogLevel::Info));
        let applier = LevelApplier::new(engine.clone());

        let applied = applier
            .apply(&map(&[("default", "WARN"), ("app#store", "DEBUG")]))
            .unwrap();
        assert_eq!(applied, 2);
        assert_eq!(engine.default_level(), LogLevel::Warn);
        assert_eq!(engine.package_level("app::store").unwrap(), LogLevel::Debug);
    }

    #[test]
    fn test_unnamed_packages_follow_effective_default() {
        let engine = Arc::new(TracingLogEngine::detached(LogLevel::Info));
        engine.set_package_level("app::net", LogLevel::Debug).unwrap();
        let applier = LevelApplier::new(engine.clone());

        applier.apply(&map(&[("default", "ERROR")])).unwrap();
        assert_eq!(engine.package_level("app::net").unwrap(), LogLevel::Error);
    }

    #[test]
    fn test_unnamed_packages_kept_without_default() {
        let engine = Arc::new(TracingLogEngine::detached(LogLevel::Info));
        engine.set_package_level("app::net", LogLevel::Debug).unwrap();
        let applier = LevelApplier::new(engine.clone());

        applier.apply(&map(&[("app#store", "WARN")])).unwrap();
        assert_eq!(engine.package_level("app::net").unwrap(), LogLevel::Debug);
        assert_eq!(engine.default_level(), LogLevel::Info);
    }

    #[test]
    fn test_partial_failure_applies_the_rest() {
        let engine = Arc::new(TracingLogEngine::detached(LogLevel::Info));
        let applier = LevelApplier::new(engine.clone());

        let err = applier
            .apply(&map(&[
                ("bad target", "DEBUG"),
                ("app#a", "LOUD"),
                ("app#b", "ERROR"),
            ]))
            .unwrap_err();

        let ApplyError::Partial { applied, failures } = err;
        // default (carried through) and app#b
        assert_eq!(applied, 2);
        assert_eq!(failures.len(), 2);
        assert!(failures
            .iter()
            .any(|f| f.key == "app#a" && matches!(f.cause, FailureCause::InvalidLevel(_))));
        assert!(failures
            .iter()
            .any(|f| f.key == "bad target" && matches!(f.cause, FailureCause::Engine(_))));
        assert_eq!(engine.package_level("app::b").unwrap(), LogLevel::Error);
    }

    #[test]
    fn test_active_levels_are_key_safe() {
        let engine = Arc::new(TracingLogEngine::detached(LogLevel::Warn));
        engine.set_package_level("app::store", LogLevel::Debug).unwrap();
        let active = LevelApplier::new(engine).active_levels();
        assert_eq!(active, map(&[("default", "WARN"), ("app#store", "DEBUG")]));
    }
}
