//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from the TOML file.

use serde::{Deserialize, Serialize};

use crate::kvconfig::keys::ConfigType;

/// Root configuration for the sync daemon.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SyncConfig {
    /// Store layout and initial contents.
    pub store: StoreConfig,

    /// Identity of this component.
    pub component: ComponentSection,

    /// Control loop behavior.
    pub controller: ControllerConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Prefix every configuration key starts with.
    pub data_prefix: String,

    /// Capacity of each change-event channel.
    pub watch_buffer: usize,

    /// Entries written to the in-memory store at startup.
    pub seed: Vec<SeedEntry>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_prefix: "service/config/".to_string(),
            watch_buffer: 64,
            seed: Vec::new(),
        }
    }
}

/// A single store entry to preload.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SeedEntry {
    pub component: String,

    #[serde(default = "default_seed_type")]
    pub config_type: ConfigType,

    pub key: String,

    pub value: String,
}

fn default_seed_type() -> ConfigType {
    ConfigType::LogLevel
}

/// Component identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ComponentSection {
    /// Label of this component. Usually supplied through `COMPONENTNAME`.
    pub label: String,

    /// Label of the subtree holding fleet-wide settings.
    pub global_label: String,
}

impl Default for ComponentSection {
    fn default() -> Self {
        Self {
            label: String::new(),
            global_label: "global".to_string(),
        }
    }
}

/// What a removed key does to applied levels.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RemovePolicy {
    /// Log the removal, keep levels as applied.
    #[default]
    Ignore,
    /// Re-derive and apply levels as for a set.
    Reconcile,
}

/// Control loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub remove_policy: RemovePolicy,

    /// Apply stored levels once before waiting for changes.
    pub sync_on_start: bool,

    /// Re-open closed watches with backoff.
    pub restart_watch: bool,

    /// First restart delay in milliseconds.
    pub restart_base_ms: u64,

    /// Restart delay cap in milliseconds.
    pub restart_max_ms: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            remove_policy: RemovePolicy::Ignore,
            sync_on_start: true,
            restart_watch: true,
            restart_base_ms: 100,
            restart_max_ms: 5_000,
        }
    }
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_format: LogFormat,

    /// Initial default level of the logging engine.
    pub log_level: String,

    /// Tracing targets registered with the engine at startup.
    pub packages: Vec<String>,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Metrics listener address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Text,
            log_level: "INFO".to_string(),
            packages: Vec::new(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9100".to_string(),
        }
    }
}
