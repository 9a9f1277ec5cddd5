//! In-memory state backend implementation

use super::{KeyEventSource, StateBackend, StateError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, RwLock};
use tracing::warn;

/// Buffered notifications per subscriber before it starts lagging
const EVENT_CAPACITY: usize = 1024;

/// In-memory state backend
///
/// Stores values in a `HashMap` behind a `tokio::sync::RwLock` and publishes
/// every written key on a broadcast channel, the same way a Valkey server with
/// keyspace notifications enabled reports `set` events.
///
/// Clones share the same map and channel.
#[derive(Debug, Clone)]
pub struct MemoryStateBackend {
    store: Arc<RwLock<HashMap<String, StoredValue>>>,
    events: broadcast::Sender<String>,
}

#[derive(Debug, Clone)]
struct StoredValue {
    data: Vec<u8>,
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn new(data: Vec<u8>, ttl: Option<Duration>) -> Self {
        let expires_at = ttl.map(|duration| Instant::now() + duration);
        Self { data, expires_at }
    }

    fn is_expired(&self) -> bool {
        self.expires_at
            .map(|expires_at| Instant::now() >= expires_at)
            .unwrap_or(false)
    }
}

impl Default for MemoryStateBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStateBackend {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
            events,
        }
    }

    /// Receive the keys of all later writes
    pub fn subscribe(&self) -> MemoryKeyEvents {
        MemoryKeyEvents {
            receiver: self.events.subscribe(),
        }
    }

    /// Remaining time-to-live of `key`; `None` if absent, expired or persistent
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        let store = self.store.read().await;
        store
            .get(key)
            .filter(|value| !value.is_expired())
            .and_then(|value| value.expires_at)
            .map(|expires_at| expires_at.saturating_duration_since(Instant::now()))
    }

    /// Number of stored keys (including expired)
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }
}

#[async_trait]
impl StateBackend for MemoryStateBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StateError> {
        let store = self.store.read().await;
        Ok(store
            .get(key)
            .filter(|value| !value.is_expired())
            .map(|value| value.data.clone()))
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), StateError> {
        {
            let mut store = self.store.write().await;
            store.insert(key.to_string(), StoredValue::new(value.to_vec(), ttl));
        }
        // No subscribers is not an error
        let _ = self.events.send(key.to_string());
        Ok(())
    }

    async fn ping(&self) -> Result<(), StateError> {
        Ok(())
    }
}

/// Write notifications from a [`MemoryStateBackend`]
#[derive(Debug)]
pub struct MemoryKeyEvents {
    receiver: broadcast::Receiver<String>,
}

#[async_trait]
impl KeyEventSource for MemoryKeyEvents {
    async fn next_key(&mut self) -> Result<Option<String>, StateError> {
        loop {
            match self.receiver.recv().await {
                Ok(key) => return Ok(Some(key)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Key event subscriber lagged; notifications dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return Ok(None),
            }
        }
    }
}
