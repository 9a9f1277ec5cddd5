//! Error types for state backend operations

use thiserror::Error;

/// Errors that can occur during state backend operations
#[derive(Debug, Error)]
pub enum StateError {
    /// Valkey/Redis unreachable or connection dropped
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Backend error: {0}")]
    BackendError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<redis::RedisError> for StateError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_refusal() || err.is_connection_dropped() {
            StateError::ConnectionError(format!("Redis connection error: {}", err))
        } else if err.is_timeout() {
            StateError::Timeout(format!("Redis timeout: {}", err))
        } else {
            StateError::BackendError(format!("Redis error: {}", err))
        }
    }
}
