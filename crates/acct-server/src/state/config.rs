//! Valkey/Redis connection configuration

use std::fmt;
use std::time::Duration;

/// Valkey/Redis connection configuration
///
/// The retry defaults (5 retries, 100 ms doubling up to 1 s) apply to every
/// command issued through [`super::ValkeyStateBackend`] and to resubscribing
/// in [`super::ValkeyKeyEvents`].
#[derive(Clone, PartialEq, Eq)]
pub struct ValkeyConfig {
    /// Connection URL: `redis://host:port/db`, `rediss://` for TLS
    pub url: String,

    /// Password sent on connect, kept out of the URL so it needs no escaping
    pub password: Option<String>,

    pub command_timeout_ms: u64,

    pub max_retries: u32,

    /// Delay before the first retry
    pub retry_delay_ms: u64,

    /// Ceiling for the doubling retry delay
    pub max_retry_delay_ms: u64,
}

fn default_command_timeout_ms() -> u64 {
    2000
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_delay_ms() -> u64 {
    100
}

fn default_max_retry_delay_ms() -> u64 {
    1000
}

impl fmt::Debug for ValkeyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValkeyConfig")
            .field("url", &self.url)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("command_timeout_ms", &self.command_timeout_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("max_retry_delay_ms", &self.max_retry_delay_ms)
            .finish()
    }
}

impl Default for ValkeyConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379/0".to_string(),
            password: None,
            command_timeout_ms: default_command_timeout_ms(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            max_retry_delay_ms: default_max_retry_delay_ms(),
        }
    }
}

impl ValkeyConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_password(mut self, password: Option<String>) -> Self {
        self.password = password.filter(|p| !p.is_empty());
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_retry_delay(mut self, initial: Duration, max: Duration) -> Self {
        self.retry_delay_ms = initial.as_millis() as u64;
        self.max_retry_delay_ms = max.as_millis() as u64;
        self
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    /// Backoff before retry number `attempt` (0-based): doubles from
    /// `retry_delay_ms`, capped at `max_retry_delay_ms`.
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.min(16);
        let delay = self.retry_delay_ms.saturating_mul(factor);
        Duration::from_millis(delay.min(self.max_retry_delay_ms))
    }
}
