//! Per-component configuration access.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::kvconfig::events::{ChangeTranslator, ConfigChangeEvent};
use crate::kvconfig::keys::{self, ConfigType, MalformedKeyError};
use crate::kvconfig::store::{KvStore, StoreError, WatchEvent};
use crate::kvconfig::value;

/// Entry point to the configuration store for every component handle.
#[derive(Clone)]
pub struct ConfigManager {
    store: Arc<dyn KvStore>,
    data_prefix: String,
    watch_buffer: usize,
}

impl ConfigManager {
    pub fn new(store: Arc<dyn KvStore>, data_prefix: impl Into<String>) -> Self {
        Self {
            store,
            data_prefix: data_prefix.into(),
            watch_buffer: 64,
        }
    }

    /// Capacity of the change-event channel handed out by `monitor`.
    pub fn with_watch_buffer(mut self, capacity: usize) -> Self {
        self.watch_buffer = capacity.max(1);
        self
    }

    pub fn data_prefix(&self) -> &str {
        &self.data_prefix
    }

    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    /// Create a handle for one component's subtree of `config_type`.
    pub fn component_config(
        &self,
        component_label: &str,
        config_type: ConfigType,
    ) -> Result<ComponentConfig, MalformedKeyError> {
        keys::validate_segment(component_label)?;
        Ok(ComponentConfig {
            manager: self.clone(),
            root: keys::build_key(&self.data_prefix, component_label, config_type),
            component_label: component_label.to_string(),
            config_type,
            subscribed: AtomicBool::new(false),
        })
    }
}

/// Handle on `<prefix><label>/<type>`.
///
/// Stateless apart from its single watch subscription.
pub struct ComponentConfig {
    manager: ConfigManager,
    root: String,
    component_label: String,
    config_type: ConfigType,
    subscribed: AtomicBool,
}

/// A running translator and the events it produces.
pub struct Subscription {
    pub events: mpsc::Receiver<ConfigChangeEvent>,
    pub task: JoinHandle<()>,
}

impl ComponentConfig {
    pub fn component_label(&self) -> &str {
        &self.component_label
    }

    pub fn config_type(&self) -> ConfigType {
        self.config_type
    }

    /// Subtree root key.
    pub fn root_key(&self) -> &str {
        &self.root
    }

    fn key_for(&self, leaf: &str) -> String {
        keys::leaf_key(&self.root, leaf)
    }

    pub async fn get(&self, leaf: &str) -> Result<Vec<u8>, StoreError> {
        Ok(self.manager.store.get(&self.key_for(leaf)).await?.value)
    }

    /// Fetch a leaf and decode it to its plain string form.
    pub async fn get_string(&self, leaf: &str) -> Result<String, StoreError> {
        let key = self.key_for(leaf);
        let raw = self.get(leaf).await?;
        value::decode_str(&raw).ok_or(StoreError::Undecodable { key })
    }

    /// Every leaf under this subtree with its raw value.
    pub async fn list_all(&self) -> Result<BTreeMap<String, Vec<u8>>, StoreError> {
        let subtree = format!("{}{}", self.root, keys::SEPARATOR);
        let pairs = self.manager.store.list(&subtree).await?;

        let mut out = BTreeMap::new();
        for (key, pair) in pairs {
            match keys::parse_watch_key(&self.manager.data_prefix, self.config_type, &key) {
                Ok(parsed) if !parsed.leaf.is_empty() => {
                    out.insert(parsed.leaf, pair.value);
                }
                Ok(_) => {}
                Err(e) => tracing::debug!(key = %key, error = %e, "Skipping unparseable entry"),
            }
        }
        Ok(out)
    }

    pub async fn put(&self, leaf: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.manager.store.put(&self.key_for(leaf), value).await
    }

    /// Serialize `value` as JSON and store it under `leaf`.
    pub async fn save<T: Serialize + ?Sized>(
        &self,
        leaf: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        let encoded = value::encode(value)
            .map_err(|e| StoreError::Unavailable(format!("failed to encode {leaf}: {e}")))?;
        self.put(leaf, encoded).await
    }

    pub async fn delete(&self, leaf: &str) -> Result<(), StoreError> {
        self.manager.store.delete(&self.key_for(leaf)).await
    }

    /// Start the raw watch on this subtree. Only one per handle.
    pub async fn subscribe(&self) -> Result<mpsc::UnboundedReceiver<WatchEvent>, StoreError> {
        if self.subscribed.swap(true, Ordering::SeqCst) {
            return Err(StoreError::AlreadySubscribed {
                key: self.root.clone(),
            });
        }
        match self.manager.store.watch_prefix(&self.root).await {
            Ok(rx) => Ok(rx),
            Err(e) => {
                self.subscribed.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    /// Subscribe and spawn a translator feeding typed change events.
    pub async fn monitor(
        &self,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<Subscription, StoreError> {
        let raw = self.subscribe().await?;
        let (tx, events) = mpsc::channel(self.manager.watch_buffer);
        let translator =
            ChangeTranslator::new(self.manager.data_prefix.clone(), self.config_type, raw, tx);
        let task = tokio::spawn(translator.run(shutdown));

        tracing::info!(key = %self.root, "Watching configuration subtree");
        Ok(Subscription { events, task })
    }
}
