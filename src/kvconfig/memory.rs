//! In-process watchable store.
//!
//! Backs the daemon when no external store is wired in, and doubles as the
//! store used by tests. Outages and dropped watches can be simulated.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::kvconfig::store::{KvPair, KvStore, StoreError, WatchEvent, WatchEventKind};

struct Watcher {
    prefix: String,
    tx: mpsc::UnboundedSender<WatchEvent>,
}

#[derive(Default)]
struct Inner {
    entries: DashMap<String, Vec<u8>>,
    watchers: Mutex<Vec<Watcher>>,
    unavailable: AtomicBool,
}

/// A thread-safe in-memory store. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail with `StoreError::Unavailable` until reset.
    pub fn set_available(&self, available: bool) {
        self.inner.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Drop every active watch, as a store does when a session is lost.
    pub fn close_watches(&self) {
        let mut watchers = self.inner.watchers.lock().expect("watcher list poisoned");
        tracing::debug!(count = watchers.len(), "Closing store watches");
        watchers.clear();
    }

    /// Number of watches still attached.
    pub fn watch_count(&self) -> usize {
        let mut watchers = self.inner.watchers.lock().expect("watcher list poisoned");
        watchers.retain(|w| !w.tx.is_closed());
        watchers.len()
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.inner.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store marked unavailable".into()));
        }
        Ok(())
    }

    fn notify(&self, event: WatchEvent) {
        let mut watchers = self.inner.watchers.lock().expect("watcher list poisoned");
        watchers.retain(|w| {
            if !event.key.starts_with(&w.prefix) {
                return !w.tx.is_closed();
            }
            w.tx.send(event.clone()).is_ok()
        });
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<KvPair, StoreError> {
        self.check_available()?;
        self.inner
            .entries
            .get(key)
            .map(|r| KvPair {
                key: key.to_string(),
                value: r.value().clone(),
            })
            .ok_or_else(|| StoreError::NotFound { key: key.to_string() })
    }

    async fn list(&self, prefix: &str) -> Result<HashMap<String, KvPair>, StoreError> {
        self.check_available()?;
        Ok(self
            .inner
            .entries
            .iter()
            .filter(|r| r.key().starts_with(prefix))
            .map(|r| {
                let pair = KvPair {
                    key: r.key().clone(),
                    value: r.value().clone(),
                };
                (r.key().clone(), pair)
            })
            .collect())
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.check_available()?;
        self.inner.entries.insert(key.to_string(), value.clone());
        self.notify(WatchEvent {
            kind: WatchEventKind::Put,
            key: key.to_string(),
            value,
        });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.check_available()?;
        if self.inner.entries.remove(key).is_some() {
            self.notify(WatchEvent {
                kind: WatchEventKind::Delete,
                key: key.to_string(),
                value: Vec::new(),
            });
        }
        Ok(())
    }

    async fn watch_prefix(
        &self,
        prefix: &str,
    ) -> Result<mpsc::UnboundedReceiver<WatchEvent>, StoreError> {
        self.check_available()?;
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .watchers
            .lock()
            .expect("watcher list poisoned")
            .push(Watcher {
                prefix: prefix.to_string(),
                tx,
            });
        Ok(rx)
    }
}
