//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Store watch closes:
//!     → loglevel::controller notices the closed event channel
//!     → backoff.rs (delay before the next attempt)
//!     → fresh ComponentConfig subscribes again
//! ```
//!
//! # Design Decisions
//! - Store reads are not retried; a failed cycle waits for the next event
//! - Only watch re-subscription backs off

pub mod backoff;
