//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Init logging → Seed store → Build controller → Spawn loop
//!
//! Shutdown (shutdown.rs):
//!     Signal received → trigger token → translators and controller exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then logging, then store and controller
//! - Every background task selects on the same shutdown token

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
