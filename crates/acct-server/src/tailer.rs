//! Audit tail of accounting key writes
//!
//! Follows the store's `set` notifications and logs one line per key in the
//! accounting namespace. Keys outside the namespace are ignored.

use crate::state::{KeyEventSource, StateError};
use crate::store::KEY_PREFIX;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Format of [`KeyObservation::timestamp`]
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// An accounting key seen on the notification stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyObservation {
    pub key: String,
    pub observed_at: DateTime<Utc>,
}

impl KeyObservation {
    /// Capture time as `YYYY-MM-DD HH:MM:SS.ffffff`, UTC
    pub fn timestamp(&self) -> String {
        self.observed_at.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Keep `key` if it belongs to the accounting namespace
pub fn observe(key: &str, now: DateTime<Utc>) -> Option<KeyObservation> {
    key.starts_with(KEY_PREFIX).then(|| KeyObservation {
        key: key.to_string(),
        observed_at: now,
    })
}

/// Logs accounting key writes reported by a [`KeyEventSource`]
#[derive(Debug, Default, Clone, Copy)]
pub struct Tailer;

impl Tailer {
    pub fn new() -> Self {
        Self
    }

    /// Consume `source` until it ends or `cancel` fires, returning the number
    /// of accounting keys observed during this run.
    ///
    /// The source is dropped on return, which closes its subscription. An
    /// error from the source ends the run. The Valkey source reconnects on
    /// its own, so in practice only cancellation stops it.
    pub async fn run<S: KeyEventSource>(
        &self,
        mut source: S,
        cancel: CancellationToken,
    ) -> Result<u64, StateError> {
        let mut count = 0u64;

        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Tailer cancelled");
                    break;
                }
                next = source.next_key() => next?,
            };

            let Some(key) = next else {
                info!("Key notification stream ended");
                break;
            };

            if let Some(observation) = observe(&key, Utc::now()) {
                info!(
                    timestamp = %observation.timestamp(),
                    key = %observation.key,
                    "Received update for RADIUS accounting key"
                );
                count += 1;
            }
        }

        Ok(count)
    }
}
