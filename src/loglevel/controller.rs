//! Log level control loop.
//!
//! # States
//! ```text
//! Watching → Reconciling: Set event (or Remove with RemovePolicy::Reconcile)
//! Reconciling → Watching: levels applied, unchanged, or store error logged
//! ```
//!
//! # Design Decisions
//! - One consumer services both subscriptions, so applies never overlap
//! - Both maps are re-read on every cycle; events only trigger, never carry state
//! - The fingerprint is committed once every entry was attempted, even if some failed
//! - A closed watch is re-opened with backoff on a fresh handle when enabled

use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::{broadcast, mpsc};

use crate::config::schema::{ControllerConfig, RemovePolicy};
use crate::kvconfig::events::{ChangeKind, ConfigChangeEvent};
use crate::kvconfig::keys::{ConfigType, MalformedKeyError};
use crate::kvconfig::manager::{ComponentConfig, ConfigManager};
use crate::kvconfig::store::StoreError;
use crate::kvconfig::value;
use crate::loglevel::applier::{ApplyError, LevelApplier};
use crate::loglevel::gate::{fingerprint, ChangeGate, Fingerprint};
use crate::loglevel::level::LevelMap;
use crate::loglevel::reconcile::reconcile;
use crate::observability::metrics;
use crate::resilience::backoff::calculate_backoff;

/// Result of one reconciliation cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Applied { fingerprint: Fingerprint, applied: usize },
    Unchanged,
    Partial {
        fingerprint: Fingerprint,
        applied: usize,
        failed: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Global,
    Component,
}

impl Scope {
    fn as_str(&self) -> &'static str {
        match self {
            Scope::Global => "global",
            Scope::Component => "component",
        }
    }
}

enum Reopen {
    Watching(mpsc::Receiver<ConfigChangeEvent>),
    Shutdown,
}

/// Keeps one component's log levels in step with the store.
pub struct LogController {
    component_label: String,
    global_label: String,
    manager: ConfigManager,
    global: ComponentConfig,
    component: ComponentConfig,
    applier: LevelApplier,
    gate: ChangeGate,
    settings: ControllerConfig,
    active: Arc<ArcSwap<LevelMap>>,
}

impl LogController {
    pub fn new(
        manager: ConfigManager,
        component_label: &str,
        global_label: &str,
        applier: LevelApplier,
        settings: ControllerConfig,
    ) -> Result<Self, MalformedKeyError> {
        let global = manager.component_config(global_label, ConfigType::LogLevel)?;
        let component = manager.component_config(component_label, ConfigType::LogLevel)?;

        Ok(Self {
            component_label: component_label.to_string(),
            global_label: global_label.to_string(),
            manager,
            global,
            component,
            applier,
            gate: ChangeGate::new(),
            settings,
            active: Arc::new(ArcSwap::from_pointee(LevelMap::new())),
        })
    }

    pub fn component_label(&self) -> &str {
        &self.component_label
    }

    /// Shared view of the last applied effective map.
    pub fn active_levels(&self) -> Arc<ArcSwap<LevelMap>> {
        self.active.clone()
    }

    pub fn last_fingerprint(&self) -> Option<Fingerprint> {
        self.gate.last().copied()
    }

    fn handle(&self, scope: Scope) -> &ComponentConfig {
        match scope {
            Scope::Global => &self.global,
            Scope::Component => &self.component,
        }
    }

    async fn fetch_levels(&self, scope: Scope) -> Result<LevelMap, StoreError> {
        let handle = self.handle(scope);
        let mut levels = LevelMap::new();
        for (leaf, raw) in handle.list_all().await? {
            match value::decode_str(&raw) {
                Some(level) => {
                    levels.insert(leaf, level);
                }
                None => tracing::warn!(
                    scope = %handle.component_label(),
                    key = %leaf,
                    "Skipping undecodable level value"
                ),
            }
        }
        Ok(levels)
    }

    /// Fetch both maps, merge, and apply if the result changed.
    pub async fn reconcile_once(&mut self) -> Result<ReconcileOutcome, StoreError> {
        let global = self.fetch_levels(Scope::Global).await?;
        let component = self.fetch_levels(Scope::Component).await?;
        let effective = reconcile(&global, &component);
        let fp = fingerprint(&effective);

        if !self.gate.should_apply(&fp) {
            tracing::debug!(fingerprint = %fp, "Log level configuration unchanged");
            metrics::record_reconcile("unchanged");
            return Ok(ReconcileOutcome::Unchanged);
        }

        let outcome = match self.applier.apply(&effective) {
            Ok(applied) => {
                metrics::record_reconcile("applied");
                ReconcileOutcome::Applied {
                    fingerprint: fp,
                    applied,
                }
            }
            Err(ApplyError::Partial { applied, failures }) => {
                metrics::record_reconcile("partial");
                ReconcileOutcome::Partial {
                    fingerprint: fp,
                    applied,
                    failed: failures.len(),
                }
            }
        };

        // Rejected entries stay rejected until the stored content changes.
        self.gate.commit(fp);
        self.active.store(Arc::new(effective));
        Ok(outcome)
    }

    async fn run_cycle(&mut self) {
        match self.reconcile_once().await {
            Ok(ReconcileOutcome::Applied { fingerprint, applied }) => tracing::info!(
                component = %self.component_label,
                fingerprint = %fingerprint,
                applied,
                "Applied log level configuration"
            ),
            Ok(ReconcileOutcome::Unchanged) => {}
            Ok(ReconcileOutcome::Partial {
                fingerprint,
                applied,
                failed,
            }) => tracing::warn!(
                component = %self.component_label,
                fingerprint = %fingerprint,
                applied,
                failed,
                "Log level configuration partially applied"
            ),
            Err(e) => {
                metrics::record_reconcile("store_error");
                tracing::error!(
                    error = %e,
                    "Failed to read log level configuration, skipping cycle"
                );
            }
        }
    }

    pub async fn handle_event(&mut self, event: ConfigChangeEvent) {
        let scope = if event.scope == self.global_label {
            Scope::Global
        } else {
            Scope::Component
        };
        metrics::record_change_event(scope.as_str(), event.kind.as_str());
        tracing::debug!(
            scope = %event.scope,
            key = %event.key,
            kind = event.kind.as_str(),
            "Config change received"
        );

        match (event.kind, self.settings.remove_policy) {
            (ChangeKind::Set, _) | (ChangeKind::Remove, RemovePolicy::Reconcile) => {
                self.run_cycle().await
            }
            (ChangeKind::Remove, RemovePolicy::Ignore) => tracing::info!(
                scope = %event.scope,
                key = %event.key,
                "Config key removed, levels left as applied"
            ),
        }
    }

    async fn open(
        &self,
        scope: Scope,
        task_shutdown: broadcast::Receiver<()>,
    ) -> Result<mpsc::Receiver<ConfigChangeEvent>, StoreError> {
        let sub = self.handle(scope).monitor(task_shutdown).await?;
        Ok(sub.events)
    }

    async fn reopen(&mut self, scope: Scope, shutdown: &mut broadcast::Receiver<()>) -> Reopen {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let delay = calculate_backoff(
                attempt,
                self.settings.restart_base_ms,
                self.settings.restart_max_ms,
            );
            tracing::info!(
                scope = scope.as_str(),
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Re-opening config watch"
            );

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.recv() => return Reopen::Shutdown,
            }

            let label = self.handle(scope).component_label().to_string();
            let fresh = match self.manager.component_config(&label, ConfigType::LogLevel) {
                Ok(fresh) => fresh,
                Err(e) => {
                    tracing::error!(error = %e, "Cannot rebuild config handle");
                    return Reopen::Shutdown;
                }
            };
            match scope {
                Scope::Global => self.global = fresh,
                Scope::Component => self.component = fresh,
            }

            let Some(task_shutdown) = task_receiver(shutdown) else {
                return Reopen::Shutdown;
            };
            match self.open(scope, task_shutdown).await {
                Ok(rx) => {
                    metrics::record_watch_restart(scope.as_str());
                    // Changes made while disconnected produced no events.
                    self.run_cycle().await;
                    return Reopen::Watching(rx);
                }
                Err(e) => {
                    tracing::warn!(scope = scope.as_str(), error = %e, "Watch re-open failed")
                }
            }
        }
    }

    /// Run until shutdown fires or every watch is closed for good.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        let mut global_rx = self.open_or_log(Scope::Global, &shutdown).await;
        let mut component_rx = self.open_or_log(Scope::Component, &shutdown).await;

        if self.settings.sync_on_start {
            self.run_cycle().await;
        }

        tracing::info!(
            component = %self.component_label,
            global = %self.global_label,
            "Log controller watching for configuration changes"
        );

        loop {
            if self.settings.restart_watch {
                for scope in [Scope::Global, Scope::Component] {
                    let slot = match scope {
                        Scope::Global => &mut global_rx,
                        Scope::Component => &mut component_rx,
                    };
                    if slot.is_some() {
                        continue;
                    }
                    match self.reopen(scope, &mut shutdown).await {
                        Reopen::Watching(rx) => *slot = Some(rx),
                        Reopen::Shutdown => return,
                    }
                }
            } else if global_rx.is_none() && component_rx.is_none() {
                tracing::warn!(
                    "All config watches closed and restarts disabled, log controller stopping"
                );
                break;
            }

            let closed = tokio::select! {
                event = recv(&mut global_rx) => match event {
                    Some(event) => { self.handle_event(event).await; None }
                    None => Some(Scope::Global),
                },
                event = recv(&mut component_rx) => match event {
                    Some(event) => { self.handle_event(event).await; None }
                    None => Some(Scope::Component),
                },
                _ = shutdown.recv() => {
                    tracing::info!("Log controller received shutdown signal, exiting loop");
                    break;
                }
            };

            match closed {
                Some(Scope::Global) => global_rx = None,
                Some(Scope::Component) => component_rx = None,
                None => continue,
            }
            tracing::warn!(
                component = %self.component_label,
                "Config watch closed, change events from that subtree have stopped"
            );
        }
    }

    async fn open_or_log(
        &self,
        scope: Scope,
        shutdown: &broadcast::Receiver<()>,
    ) -> Option<mpsc::Receiver<ConfigChangeEvent>> {
        let task_shutdown = task_receiver(shutdown)?;
        match self.open(scope, task_shutdown).await {
            Ok(rx) => Some(rx),
            Err(e) => {
                tracing::error!(scope = scope.as_str(), error = %e, "Failed to open config watch");
                None
            }
        }
    }
}

/// Shutdown receiver for a new translator task, or `None` if shutdown already fired.
fn task_receiver(shutdown: &broadcast::Receiver<()>) -> Option<broadcast::Receiver<()>> {
    let task_shutdown = shutdown.resubscribe();
    // A trigger sent before the resubscribe is only queued on the original.
    shutdown.is_empty().then_some(task_shutdown)
}

/// Receive from an optional channel; a missing channel never yields.
async fn recv(rx: &mut Option<mpsc::Receiver<ConfigChangeEvent>>) -> Option<ConfigChangeEvent> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
