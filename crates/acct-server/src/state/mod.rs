//! Key-value store abstraction
//!
//! Accounting records are written through [`StateBackend`] and write
//! notifications are read through [`KeyEventSource`]. Two implementations:
//!
//! - **ValkeyStateBackend** / **ValkeyKeyEvents**: Valkey or Redis, with
//!   keyspace notifications delivered over `PSUBSCRIBE`
//! - **MemoryStateBackend** / **MemoryKeyEvents**: local map that emits a
//!   notification on every write (tests and single-process runs)
//!
//! # Usage
//!
//! ```rust
//! use acct_server::state::{KeyEventSource, MemoryStateBackend, StateBackend};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), acct_server::state::StateError> {
//! let backend = MemoryStateBackend::new();
//! let mut events = backend.subscribe();
//!
//! backend.set("radius:acct:alice:s1:20250621T100000", b"{}", Some(Duration::from_secs(60))).await?;
//! assert_eq!(events.next_key().await?.as_deref(), Some("radius:acct:alice:s1:20250621T100000"));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod memory;
pub mod valkey;

pub use config::ValkeyConfig;
pub use error::StateError;
pub use memory::{MemoryKeyEvents, MemoryStateBackend};
pub use valkey::{ValkeyKeyEvents, ValkeyStateBackend};

use async_trait::async_trait;
use std::time::Duration;

/// Storage operations used by the persistence gateway.
///
/// Implementations must be shareable across handler tasks.
#[async_trait]
pub trait StateBackend: Send + Sync {
    /// `Ok(None)` if the key doesn't exist or has expired
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StateError>;

    /// Set a value, replacing any previous one; expires after `ttl` if given
    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), StateError>;

    /// Connectivity check
    async fn ping(&self) -> Result<(), StateError>;
}

/// Stream of keys reported as written by the store.
///
/// Dropping the source closes the underlying subscription.
#[async_trait]
pub trait KeyEventSource: Send {
    /// Next written key, or `Ok(None)` once the stream has ended
    async fn next_key(&mut self) -> Result<Option<String>, StateError>;
}
