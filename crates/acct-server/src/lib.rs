//! RADIUS Accounting Server
//!
//! Receives RADIUS Accounting-Request packets over UDP, stores each one as a
//! JSON record in Valkey/Redis for 24 hours and acknowledges it with an
//! Accounting-Response. A separate tailer follows the store's keyspace
//! notifications and logs every accounting key written.
//!
//! Built on the `acct-proto` codec.
//!
//! # Features
//!
//! - Async I/O with Tokio, one task per datagram
//! - Constant-time request authenticator verification
//! - Response sent only after the record is persisted
//! - Valkey/Redis and in-memory backends
//! - Structured logging to stdout and an optional JSON file
//!
//! # Example
//!
//! ```rust,no_run
//! use acct_server::{AccountingHandler, AccountingServer, ServerConfig, StateStore};
//! use acct_server::state::{ValkeyConfig, ValkeyStateBackend};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = ValkeyStateBackend::new(ValkeyConfig::new("redis://localhost:6379/0")).await?;
//!     let handler = AccountingHandler::new("testing123", Arc::new(StateStore::new(backend)));
//!
//!     let server = AccountingServer::bind(ServerConfig::new("0.0.0.0:1813".parse()?), handler).await?;
//!     server.run(CancellationToken::new()).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod handler;
pub mod logging;
pub mod record;
pub mod server;
pub mod shutdown;
pub mod state;
pub mod store;
pub mod tailer;

pub use config::{LogSettings, ServerSettings, StoreSettings, TailerSettings};
pub use handler::AccountingHandler;
pub use record::AccountingRecord;
pub use server::{AccountingServer, ServerConfig, ServerError};
pub use store::{record_key, AccountingStore, StateStore, StoreError};
pub use tailer::{observe, KeyObservation, Tailer};
