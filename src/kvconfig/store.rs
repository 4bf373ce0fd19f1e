//! Watchable key-value store capability.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors surfaced by a store backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("key not found: {key}")]
    NotFound { key: String },

    #[error("value at {key} is not a string")]
    Undecodable { key: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("subtree {key} already has an active subscription")]
    AlreadySubscribed { key: String },
}

/// A stored entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvPair {
    pub key: String,
    pub value: Vec<u8>,
}

/// Raw event kind as reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEventKind {
    Put,
    Delete,
}

/// Raw watch notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub kind: WatchEventKind,
    pub key: String,
    /// Empty for deletes.
    pub value: Vec<u8>,
}

/// Store operations the configuration layer depends on.
///
/// Implementations own consistency and delivery; callers only rely on
/// per-watch ordering.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<KvPair, StoreError>;

    /// Every entry whose key starts with `prefix`.
    async fn list(&self, prefix: &str) -> Result<HashMap<String, KvPair>, StoreError>;

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Stream of changes to `prefix` and every key below it.
    ///
    /// The receiver yields `None` once the store drops the watch.
    async fn watch_prefix(
        &self,
        prefix: &str,
    ) -> Result<mpsc::UnboundedReceiver<WatchEvent>, StoreError>;
}
