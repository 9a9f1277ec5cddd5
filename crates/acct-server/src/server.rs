use crate::handler::AccountingHandler;
use crate::store::StoreError;
use acct_proto::{DecodeError, PacketError};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Largest datagram read from the socket (RFC 2865 maximum packet size)
const RECV_BUFFER_SIZE: usize = 4096;

/// Largest accepted `max_in_flight`; larger limits are clamped to it
pub const MAX_IN_FLIGHT_LIMIT: usize = Semaphore::MAX_PERMITS;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Encode error: {0}")]
    Encode(#[from] PacketError),
}

/// Listener configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the UDP socket to
    pub bind_addr: SocketAddr,
    /// Upper bound on concurrently running handlers; `None` is unbounded
    pub max_in_flight: Option<usize>,
}

impl ServerConfig {
    pub fn new(bind_addr: SocketAddr) -> Self {
        ServerConfig {
            bind_addr,
            max_in_flight: None,
        }
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = Some(max_in_flight);
        self
    }
}

/// RADIUS accounting listener
///
/// Receives datagrams on one socket and hands each to an
/// [`AccountingHandler`] on its own task. Responses go out on the same socket.
pub struct AccountingServer {
    socket: Arc<UdpSocket>,
    handler: Arc<AccountingHandler>,
    admission: Option<Arc<Semaphore>>,
}

impl AccountingServer {
    /// Bind the listening socket
    pub async fn bind(config: ServerConfig, handler: AccountingHandler) -> Result<Self, ServerError> {
        let socket = UdpSocket::bind(config.bind_addr).await?;
        info!(
            bind_addr = %socket.local_addr()?,
            max_in_flight = ?config.max_in_flight,
            "RADIUS accounting server listening"
        );

        Ok(AccountingServer {
            socket: Arc::new(socket),
            handler: Arc::new(handler),
            admission: config
                .max_in_flight
                .map(|limit| Arc::new(Semaphore::new(limit.clamp(1, MAX_IN_FLIGHT_LIMIT)))),
        })
    }

    /// Get the local address the server is listening on
    ///
    /// This is useful for testing when binding to port 0 (OS-assigned port)
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.socket.local_addr().map_err(ServerError::from)
    }

    /// Receive and dispatch datagrams until `cancel` fires.
    ///
    /// Per-datagram failures never end the loop. Handlers still running when
    /// the loop exits are not waited for.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), ServerError> {
        let mut buf = vec![0u8; RECV_BUFFER_SIZE];

        loop {
            let received = tokio::select! {
                _ = cancel.cancelled() => break,
                received = self.socket.recv_from(&mut buf) => received,
            };

            let (len, addr) = match received {
                Ok(received) => received,
                Err(e) => {
                    error!(error = %e, "Failed to read from UDP socket");
                    continue;
                }
            };
            let data = buf[..len].to_vec();

            let permit = match &self.admission {
                Some(semaphore) => {
                    let acquired = tokio::select! {
                        _ = cancel.cancelled() => break,
                        acquired = Arc::clone(semaphore).acquire_owned() => acquired,
                    };
                    match acquired {
                        Ok(permit) => Some(permit),
                        // The semaphore is never closed
                        Err(_) => None,
                    }
                }
                None => None,
            };

            let handler = Arc::clone(&self.handler);
            let socket = Arc::clone(&self.socket);

            tokio::spawn(async move {
                let _permit = permit;
                if let Err(e) = handler.handle(&data, addr, &socket).await {
                    debug!("Error handling request from {}: {}", addr, e);
                }
            });
        }

        info!("RADIUS accounting server stopped");
        Ok(())
    }
}
