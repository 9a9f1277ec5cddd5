//! Valkey/Redis state backend and keyspace notification subscriber

use super::config::ValkeyConfig;
use super::{KeyEventSource, StateBackend, StateError};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, ConnectionInfo, IntoConnectionInfo, Msg, RedisError};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, info, warn};

/// Keyevent channel pattern for `SET` on every database
pub const KEYEVENT_SET_PATTERN: &str = "__keyevent@*__:set";

/// Event classes needed for [`KEYEVENT_SET_PATTERN`]: keyevent (`E`) for
/// string commands (`$`)
pub const KEYEVENT_SET_FLAGS: &str = "E$";

type CommandFuture<T> = Pin<Box<dyn Future<Output = Result<T, RedisError>> + Send>>;

fn connection_info(config: &ValkeyConfig) -> Result<ConnectionInfo, RedisError> {
    let mut info = config.url.as_str().into_connection_info()?;
    if let Some(ref password) = config.password {
        info.redis.password = Some(password.clone());
    }
    Ok(info)
}

fn open_client(config: &ValkeyConfig) -> Result<Client, StateError> {
    connection_info(config)
        .and_then(Client::open)
        .map_err(|e| StateError::ConfigError(format!("Invalid Valkey URL: {}", e)))
}

/// Valkey/Redis state backend
///
/// # Features
///
/// - Connection pooling and reconnection via `ConnectionManager`
/// - Per-command timeout
/// - Bounded retries with doubling backoff
///
/// # Example
///
/// ```no_run
/// use acct_server::state::{StateBackend, ValkeyConfig, ValkeyStateBackend};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = ValkeyStateBackend::new(ValkeyConfig::new("redis://localhost:6379/0")).await?;
/// backend.ping().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ValkeyStateBackend {
    conn: ConnectionManager,
    config: ValkeyConfig,
}

impl ValkeyStateBackend {
    /// Connect to the configured server.
    ///
    /// Fails if the URL is invalid or the server cannot be reached.
    pub async fn new(config: ValkeyConfig) -> Result<Self, StateError> {
        let client = open_client(&config)?;

        let conn = ConnectionManager::new(client).await.map_err(|e| {
            StateError::ConnectionError(format!("Failed to connect to Valkey: {}", e))
        })?;

        Ok(Self { conn, config })
    }

    /// Run `f` against a clone of the managed connection, retrying failures
    /// and timeouts up to `max_retries` times.
    async fn with_retry<F, T>(&self, command: &'static str, mut f: F) -> Result<T, StateError>
    where
        F: FnMut(ConnectionManager) -> CommandFuture<T>,
    {
        let timeout = self.config.command_timeout();
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            let error = match tokio::time::timeout(timeout, f(self.conn.clone())).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => StateError::from(e),
                Err(_) => StateError::Timeout(format!("{} timed out after {:?}", command, timeout)),
            };

            if attempt < self.config.max_retries {
                let delay = self.config.retry_delay(attempt);
                debug!(command, attempt, error = %error, ?delay, "Retrying Valkey command");
                tokio::time::sleep(delay).await;
            }
            last_error = Some(error);
        }

        Err(last_error
            .unwrap_or_else(|| StateError::BackendError(format!("{} was never attempted", command))))
    }
}

#[async_trait]
impl StateBackend for ValkeyStateBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StateError> {
        let key = key.to_string();

        self.with_retry("GET", move |mut conn| {
            let key = key.clone();
            Box::pin(async move { conn.get(&key).await })
        })
        .await
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), StateError> {
        let key = key.to_string();
        let value = value.to_vec();

        self.with_retry("SET", move |mut conn| {
            let key = key.clone();
            let value = value.clone();
            Box::pin(async move {
                match ttl {
                    Some(ttl) => {
                        // EX takes whole seconds
                        let ttl_secs = ttl.as_secs().max(1);
                        redis::cmd("SET")
                            .arg(&key)
                            .arg(&value)
                            .arg("EX")
                            .arg(ttl_secs)
                            .query_async(&mut conn)
                            .await
                    }
                    None => conn.set(&key, &value).await,
                }
            })
        })
        .await
    }

    async fn ping(&self) -> Result<(), StateError> {
        self.with_retry("PING", |mut conn| {
            Box::pin(async move { redis::cmd("PING").query_async(&mut conn).await })
        })
        .await
    }
}

impl std::fmt::Debug for ValkeyStateBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValkeyStateBackend")
            .field("url", &self.config.url)
            .finish()
    }
}

type MessageStream = Pin<Box<dyn Stream<Item = Msg> + Send>>;
type Connector = Box<dyn FnMut() -> CommandFuture<MessageStream> + Send>;

async fn open_subscription(config: ValkeyConfig, pattern: String) -> Result<MessageStream, RedisError> {
    let client = Client::open(connection_info(&config)?)?;
    let mut pubsub = client.get_async_pubsub().await?;
    pubsub.psubscribe(&pattern).await?;
    Ok(Box::pin(pubsub.into_on_message()))
}

/// Keyspace `set` notifications delivered over a pattern subscription.
///
/// The server must have keyevent notifications for string commands enabled
/// (`notify-keyspace-events` containing `E$`, or see
/// [`enable_keyevent_notifications`]).
///
/// When the subscription drops the source reconnects and subscribes again,
/// backing off per [`ValkeyConfig::retry_delay`]; `next_key` only returns
/// once a key arrives. Payloads that are not UTF-8 are skipped.
pub struct ValkeyKeyEvents {
    config: ValkeyConfig,
    connect: Connector,
    messages: Option<MessageStream>,
}

impl ValkeyKeyEvents {
    /// Subscribe to [`KEYEVENT_SET_PATTERN`]
    pub async fn subscribe(config: &ValkeyConfig) -> Result<Self, StateError> {
        Self::subscribe_pattern(config, KEYEVENT_SET_PATTERN).await
    }

    /// Subscribe to `pattern`; the first subscription must succeed.
    pub async fn subscribe_pattern(config: &ValkeyConfig, pattern: &str) -> Result<Self, StateError> {
        // A bad URL is never worth retrying
        open_client(config)?;

        let connect_config = config.clone();
        let pattern = pattern.to_string();
        let mut events = Self::with_connector(
            config.clone(),
            Box::new(move || -> CommandFuture<MessageStream> {
                Box::pin(open_subscription(connect_config.clone(), pattern.clone()))
            }),
        );
        events.messages = Some((events.connect)().await?);
        Ok(events)
    }

    fn with_connector(config: ValkeyConfig, connect: Connector) -> Self {
        Self {
            config,
            connect,
            messages: None,
        }
    }

    /// Subscribe again, retrying until it succeeds
    async fn resubscribe(&mut self) -> MessageStream {
        let mut attempt = 0u32;
        loop {
            match (self.connect)().await {
                Ok(messages) => {
                    info!(attempt, "Resubscribed to keyspace notifications");
                    return messages;
                }
                Err(e) => {
                    let delay = self.config.retry_delay(attempt);
                    warn!(attempt, error = %e, ?delay, "Keyspace notification subscription failed");
                    tokio::time::sleep(delay).await;
                    attempt = attempt.saturating_add(1);
                }
            }
        }
    }
}

#[async_trait]
impl KeyEventSource for ValkeyKeyEvents {
    async fn next_key(&mut self) -> Result<Option<String>, StateError> {
        loop {
            if self.messages.is_none() {
                let messages = self.resubscribe().await;
                self.messages = Some(messages);
            }
            let Some(messages) = self.messages.as_mut() else {
                continue;
            };

            match messages.next().await {
                // Keyevent messages carry the key name as payload
                Some(msg) => match std::str::from_utf8(msg.get_payload_bytes()) {
                    Ok(key) => return Ok(Some(key.to_string())),
                    Err(_) => {
                        debug!(
                            channel = msg.get_channel_name(),
                            len = msg.get_payload_bytes().len(),
                            "Skipping non UTF-8 key notification"
                        );
                    }
                },
                None => {
                    warn!("Keyspace notification subscription closed; reconnecting");
                    self.messages = None;
                }
            }
        }
    }
}

impl std::fmt::Debug for ValkeyKeyEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValkeyKeyEvents")
            .field("url", &self.config.url)
            .field("subscribed", &self.messages.is_some())
            .finish_non_exhaustive()
    }
}

/// Turn on keyevent notifications for string commands.
///
/// Replaces the server's current `notify-keyspace-events` value.
pub async fn enable_keyevent_notifications(config: &ValkeyConfig) -> Result<(), StateError> {
    let client = open_client(config)?;
    let mut conn = client.get_multiplexed_async_connection().await?;
    let _: () = redis::cmd("CONFIG")
        .arg("SET")
        .arg("notify-keyspace-events")
        .arg(KEYEVENT_SET_FLAGS)
        .query_async(&mut conn)
        .await?;
    Ok(())
}
