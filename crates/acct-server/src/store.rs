//! Persistence of accounting records
//!
//! Every record is written once, as JSON, under
//! `radius:acct:<username>:<session>:<YYYYMMDDTHHMMSS>` with a 24 hour
//! expiry. Two packets for the same user and session within the same second
//! share a key; the later write wins.

use crate::record::AccountingRecord;
use crate::state::{StateBackend, StateError};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Namespace shared by all accounting keys
pub const KEY_PREFIX: &str = "radius:acct:";

/// Expiry applied to every stored record
pub const RECORD_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Second-resolution timestamp used as the last key segment
pub const KEY_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to serialize accounting record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Failed to store {key}: {source}")]
    Backend {
        key: String,
        #[source]
        source: StateError,
    },
}

/// Write side of accounting persistence
#[async_trait]
pub trait AccountingStore: Send + Sync {
    async fn save(&self, record: &AccountingRecord) -> Result<(), StoreError>;
}

/// Key under which `record` is stored
pub fn record_key(record: &AccountingRecord) -> String {
    format!(
        "{}{}:{}:{}",
        KEY_PREFIX,
        record.username,
        record.acct_session_id,
        record.timestamp.format(KEY_TIMESTAMP_FORMAT)
    )
}

/// [`AccountingStore`] over any [`StateBackend`]
#[derive(Debug, Clone)]
pub struct StateStore<B> {
    backend: B,
    ttl: Duration,
}

impl<B: StateBackend> StateStore<B> {
    pub fn new(backend: B) -> Self {
        Self::with_ttl(backend, RECORD_TTL)
    }

    pub fn with_ttl(backend: B, ttl: Duration) -> Self {
        Self { backend, ttl }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

#[async_trait]
impl<B: StateBackend> AccountingStore for StateStore<B> {
    async fn save(&self, record: &AccountingRecord) -> Result<(), StoreError> {
        let key = record_key(record);
        let value = serde_json::to_vec(record)?;

        self.backend
            .set(&key, &value, Some(self.ttl))
            .await
            .map_err(|source| StoreError::Backend {
                key: key.clone(),
                source,
            })?;

        debug!(key = %key, bytes = value.len(), "Wrote accounting record");
        Ok(())
    }
}
