//! Metrics collection and exposition.
//!
//! # Metrics
//! - `logsync_change_events_total` (counter): change events by scope, kind
//! - `logsync_dropped_events_total` (counter): watch events dropped by reason
//! - `logsync_reconcile_total` (counter): reconciliation cycles by outcome
//! - `logsync_apply_failures_total` (counter): entries the engine rejected
//! - `logsync_watch_restarts_total` (counter): re-opened watches by scope
//!
//! # Design Decisions
//! - Scope labels are `global`/`component`, never raw component labels
//! - Recording is a no-op until an exporter is installed

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

pub fn record_change_event(scope: &'static str, kind: &'static str) {
    metrics::counter!("logsync_change_events_total", "scope" => scope, "kind" => kind).increment(1);
}

pub fn record_dropped_event(reason: &'static str) {
    metrics::counter!("logsync_dropped_events_total", "reason" => reason).increment(1);
}

pub fn record_reconcile(outcome: &'static str) {
    metrics::counter!("logsync_reconcile_total", "outcome" => outcome).increment(1);
}

pub fn record_apply_failure() {
    metrics::counter!("logsync_apply_failures_total").increment(1);
}

pub fn record_watch_restart(scope: &'static str) {
    metrics::counter!("logsync_watch_restarts_total", "scope" => scope).increment(1);
}
