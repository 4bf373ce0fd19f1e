//! Translation of raw store notifications into typed change events.
//!
//! # Design Decisions
//! - One translator task per subscription, so ordering holds per subscription only
//! - Unparseable keys are dropped and logged, the task keeps running
//! - The task ends when its input closes, its consumer goes away, or shutdown fires

use tokio::sync::{broadcast, mpsc};

use crate::kvconfig::keys::{parse_watch_key, ConfigType};
use crate::kvconfig::store::{WatchEvent, WatchEventKind};
use crate::observability::metrics;

/// Kind of configuration change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Set,
    Remove,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Set => "set",
            ChangeKind::Remove => "remove",
        }
    }
}

impl From<WatchEventKind> for ChangeKind {
    fn from(kind: WatchEventKind) -> Self {
        match kind {
            WatchEventKind::Put => ChangeKind::Set,
            WatchEventKind::Delete => ChangeKind::Remove,
        }
    }
}

/// A change to one leaf of a component's configuration subtree.
///
/// `key` and `scope` are never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigChangeEvent {
    pub kind: ChangeKind,
    /// Leaf config key, e.g. a package name or `default`.
    pub key: String,
    /// Label of the component owning the key.
    pub scope: String,
    pub value: Vec<u8>,
}

/// Background task turning a raw watch into [`ConfigChangeEvent`]s.
pub struct ChangeTranslator {
    prefix: String,
    config_type: ConfigType,
    raw: mpsc::UnboundedReceiver<WatchEvent>,
    events: mpsc::Sender<ConfigChangeEvent>,
}

impl ChangeTranslator {
    pub fn new(
        prefix: impl Into<String>,
        config_type: ConfigType,
        raw: mpsc::UnboundedReceiver<WatchEvent>,
        events: mpsc::Sender<ConfigChangeEvent>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            config_type,
            raw,
            events,
        }
    }

    /// Decode one notification. `None` means it was dropped.
    pub fn translate(&self, raw: WatchEvent) -> Option<ConfigChangeEvent> {
        let parsed = match parse_watch_key(&self.prefix, self.config_type, &raw.key) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(
                    key = %raw.key,
                    error = %e,
                    "Dropping watch event with malformed key"
                );
                metrics::record_dropped_event("malformed_key");
                return None;
            }
        };

        if parsed.leaf.is_empty() {
            tracing::debug!(key = %raw.key, "Ignoring watch event on subtree root");
            metrics::record_dropped_event("subtree_root");
            return None;
        }

        Some(ConfigChangeEvent {
            kind: raw.kind.into(),
            key: parsed.leaf,
            scope: parsed.owner,
            value: raw.value,
        })
    }

    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        loop {
            tokio::select! {
                raw = self.raw.recv() => {
                    let Some(raw) = raw else {
                        tracing::warn!(
                            prefix = %self.prefix,
                            config_type = %self.config_type,
                            "Store watch closed, no further change events will be delivered"
                        );
                        break;
                    };
                    let Some(event) = self.translate(raw) else { continue };
                    if self.events.send(event).await.is_err() {
                        tracing::debug!("Change event consumer gone, stopping translator");
                        break;
                    }
                }
                _ = shutdown.recv() => {
                    tracing::debug!(
                        config_type = %self.config_type,
                        "Translator received shutdown signal"
                    );
                    break;
                }
            }
        }
    }
}
