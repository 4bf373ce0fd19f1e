//! Live log level management.
//!
//! # Data Flow
//! ```text
//! ConfigChangeEvent (global or component subtree)
//!     → controller.rs (fetch both subtrees via list_all)
//!     → reconcile.rs (component entries win, component default as fallback)
//!     → gate.rs (fingerprint, skip if unchanged)
//!     → applier.rs (merge with active engine levels, set each level)
//!     → engine.rs (LogEngine: reloadable tracing filter)
//! ```
//!
//! # Design Decisions
//! - Every merge produces a new map; inputs are never mutated
//! - The engine is an injected capability so tests can record calls
//! - Failing entries are logged and skipped, the rest still apply

pub mod applier;
pub mod controller;
pub mod engine;
pub mod gate;
pub mod level;
pub mod reconcile;

pub use applier::{ApplyError, LevelApplier};
pub use controller::{LogController, ReconcileOutcome};
pub use engine::{EngineError, LogEngine, TracingLogEngine};
pub use gate::{fingerprint, ChangeGate, Fingerprint};
pub use level::{LevelMap, LogLevel, DEFAULT_KEY};
pub use reconcile::reconcile;
