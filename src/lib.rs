//! Live log level propagation from a watchable configuration store.

pub mod config;
pub mod kvconfig;
pub mod lifecycle;
pub mod loglevel;
pub mod observability;
pub mod resilience;

pub use config::schema::SyncConfig;
pub use kvconfig::{ConfigManager, ConfigType, KvStore, MemoryStore};
pub use lifecycle::Shutdown;
pub use loglevel::{LogController, LogEngine, TracingLogEngine};
