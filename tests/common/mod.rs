//! Shared fakes and helpers for integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log_config_sync::config::schema::ControllerConfig;
use log_config_sync::kvconfig::{ConfigManager, ConfigType, MemoryStore};
use log_config_sync::kvconfig::manager::ComponentConfig;
use log_config_sync::loglevel::{EngineError, LevelApplier, LogController, LogEngine, LogLevel};

pub const PREFIX: &str = "service/config/";
pub const COMPONENT: &str = "adapter";

/// A call the engine accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Default(LogLevel),
    Package(String, LogLevel),
}

#[derive(Default)]
struct State {
    default: Option<LogLevel>,
    packages: BTreeMap<String, LogLevel>,
    rejected: HashSet<String>,
    calls: Vec<Call>,
}

/// Logging engine fake that records every accepted level change.
#[derive(Default)]
pub struct RecordingEngine {
    state: Mutex<State>,
}

impl RecordingEngine {
    pub fn new(default: LogLevel) -> Arc<Self> {
        let engine = Self::default();
        engine.state.lock().unwrap().default = Some(default);
        Arc::new(engine)
    }

    pub fn with_package(self: Arc<Self>, package: &str, level: LogLevel) -> Arc<Self> {
        self.state.lock().unwrap().packages.insert(package.to_string(), level);
        self
    }

    /// Make `set_package_level` fail for `package`.
    pub fn reject(self: Arc<Self>, package: &str) -> Arc<Self> {
        self.state.lock().unwrap().rejected.insert(package.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn package_calls(&self, package: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Package(p, _) if p == package))
            .count()
    }

    pub fn default_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Default(_)))
            .count()
    }

    pub fn level_of(&self, package: &str) -> Option<LogLevel> {
        self.state.lock().unwrap().packages.get(package).copied()
    }
}

impl LogEngine for RecordingEngine {
    fn default_level(&self) -> LogLevel {
        self.state.lock().unwrap().default.unwrap_or(LogLevel::Info)
    }

    fn set_default_level(&self, level: LogLevel) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        state.default = Some(level);
        state.calls.push(Call::Default(level));
        Ok(())
    }

    fn package_names(&self) -> Vec<String> {
        self.state.lock().unwrap().packages.keys().cloned().collect()
    }

    fn package_level(&self, package: &str) -> Result<LogLevel, EngineError> {
        self.level_of(package)
            .ok_or_else(|| EngineError::UnknownPackage(package.to_string()))
    }

    fn set_package_level(&self, package: &str, level: LogLevel) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        if state.rejected.contains(package) {
            return Err(EngineError::UnknownPackage(package.to_string()));
        }
        state.packages.insert(package.to_string(), level);
        state.calls.push(Call::Package(package.to_string(), level));
        Ok(())
    }
}

pub struct Harness {
    pub store: MemoryStore,
    pub manager: ConfigManager,
    pub global: ComponentConfig,
    pub component: ComponentConfig,
}

impl Harness {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let manager = ConfigManager::new(Arc::new(store.clone()), PREFIX);
        let global = manager.component_config("global", ConfigType::LogLevel).unwrap();
        let component = manager.component_config(COMPONENT, ConfigType::LogLevel).unwrap();
        Self {
            store,
            manager,
            global,
            component,
        }
    }

    pub fn controller(
        &self,
        engine: Arc<RecordingEngine>,
        settings: ControllerConfig,
    ) -> LogController {
        LogController::new(
            self.manager.clone(),
            COMPONENT,
            "global",
            LevelApplier::new(engine),
            settings,
        )
        .unwrap()
    }
}

/// Controller settings with quick restarts.
pub fn settings() -> ControllerConfig {
    ControllerConfig {
        restart_base_ms: 10,
        restart_max_ms: 50,
        ..ControllerConfig::default()
    }
}

/// Poll `check` until it holds or two seconds pass.
pub async fn wait_until<F>(mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
