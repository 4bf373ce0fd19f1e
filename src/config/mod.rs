//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + COMPONENTNAME
//!     → loader.rs (parse, apply component override)
//!     → validation.rs (semantic checks)
//!     → SyncConfig (validated, immutable)
//!     → lifecycle::startup wires store, engine and controller
//! ```
//!
//! # Design Decisions
//! - This is the daemon's own config; live log levels come from the store
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::SyncConfig;
pub use schema::ControllerConfig;
pub use schema::ObservabilityConfig;
pub use schema::RemovePolicy;
