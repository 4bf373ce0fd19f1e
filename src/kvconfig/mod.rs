//! Watchable configuration store access.
//!
//! # Data Flow
//! ```text
//! store (KvStore)
//!     → manager.rs (ComponentConfig: get/list/put/delete, subscribe)
//!     → raw WatchEvent stream per subtree
//!     → events.rs (ChangeTranslator: parse key via keys.rs)
//!     → ConfigChangeEvent channel
//!     → consumer (loglevel::controller)
//! ```
//!
//! # Design Decisions
//! - keys.rs is the only place that knows the key layout
//! - Each ComponentConfig owns at most one watch; reconnecting is the caller's job
//! - Values are persisted as JSON and decoded through value.rs

pub mod events;
pub mod keys;
pub mod manager;
pub mod memory;
pub mod store;
pub mod value;

pub use events::{ChangeKind, ConfigChangeEvent};
pub use keys::{ConfigType, MalformedKeyError};
pub use manager::{ComponentConfig, ConfigManager, Subscription};
pub use memory::MemoryStore;
pub use store::{KvPair, KvStore, StoreError, WatchEvent, WatchEventKind};
