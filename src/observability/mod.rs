//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events through a reloadable filter)
//!     → metrics.rs (counters)
//!
//! Consumers:
//!     → Log aggregation (stdout, text or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - The log filter is owned by the LogEngine, not by env vars
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
