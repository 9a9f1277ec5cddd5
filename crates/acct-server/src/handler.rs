//! Per-datagram accounting request handling

use crate::record::AccountingRecord;
use crate::server::ServerError;
use crate::store::AccountingStore;
use acct_proto::{decode_accounting_request, encode_accounting_response, DecodeError};
use chrono::Utc;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tracing::{debug, error, info, warn};

/// Authenticates, persists and acknowledges one Accounting-Request.
///
/// A response is sent only after the record has been stored. Every failure is
/// logged here and also returned to the caller.
pub struct AccountingHandler {
    secret: Vec<u8>,
    store: Arc<dyn AccountingStore>,
}

impl AccountingHandler {
    pub fn new(secret: impl Into<Vec<u8>>, store: Arc<dyn AccountingStore>) -> Self {
        Self {
            secret: secret.into(),
            store,
        }
    }

    /// Handle the datagram `data` received from `source`, replying on `socket`
    pub async fn handle(
        &self,
        data: &[u8],
        source: SocketAddr,
        socket: &UdpSocket,
    ) -> Result<(), ServerError> {
        let request = match decode_accounting_request(data, &self.secret) {
            Ok(request) => request,
            Err(DecodeError::UnsupportedCode(code)) => {
                info!(client_addr = %source, code, "Ignoring non-accounting packet");
                return Err(DecodeError::UnsupportedCode(code).into());
            }
            Err(DecodeError::AuthenticationFailed) => {
                let request_id = data.get(1).copied().unwrap_or(0);
                warn!(
                    client_addr = %source,
                    request_id,
                    "Rejected accounting request with invalid authenticator"
                );
                return Err(DecodeError::AuthenticationFailed.into());
            }
            Err(e) => {
                warn!(client_addr = %source, len = data.len(), error = %e, "Rejected malformed packet");
                return Err(e.into());
            }
        };

        debug!(
            client_addr = %source,
            request_id = request.identifier,
            attributes = request.attributes.len(),
            "Received Accounting-Request"
        );

        let record = AccountingRecord::from_packet(&request, source.ip(), Utc::now());

        if let Err(e) = self.store.save(&record).await {
            error!(
                client_addr = %source,
                username = %record.username,
                session = %record.acct_session_id,
                error = %e,
                "Failed to store accounting record"
            );
            return Err(e.into());
        }

        info!(
            username = %record.username,
            status = %record.acct_status_type,
            session = %record.acct_session_id,
            nas_ip = %record.nas_ip_address,
            client_ip = %record.client_ip,
            "Stored accounting record"
        );

        let response = encode_accounting_response(request.identifier, &request.authenticator, &self.secret)?;

        if let Err(e) = socket.send_to(&response, source).await {
            error!(client_addr = %source, request_id = request.identifier, error = %e, "Failed to send Accounting-Response");
            return Err(e.into());
        }

        debug!(client_addr = %source, request_id = request.identifier, "Sent Accounting-Response");
        Ok(())
    }
}

impl std::fmt::Debug for AccountingHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountingHandler")
            .field("secret", &"<redacted>")
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::capture_json_logs;
    use crate::store::StoreError;
    use crate::state::StateError;
    use acct_proto::{
        sign_accounting_request, verify_response_authenticator, Attribute, AttributeType, Code,
        Packet,
    };
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::Mutex;

    const SECRET: &[u8] = b"testing123";

    #[derive(Default)]
    struct RecordingStore {
        saved: Mutex<Vec<AccountingRecord>>,
    }

    #[async_trait]
    impl AccountingStore for RecordingStore {
        async fn save(&self, record: &AccountingRecord) -> Result<(), StoreError> {
            self.saved.lock().await.push(record.clone());
            Ok(())
        }
    }

    struct FailingStore;

    #[async_trait]
    impl AccountingStore for FailingStore {
        async fn save(&self, _record: &AccountingRecord) -> Result<(), StoreError> {
            Err(StoreError::Backend {
                key: "radius:acct:x".to_string(),
                source: StateError::Timeout("SET timed out".to_string()),
            })
        }
    }

    fn request(id: u8) -> Packet {
        let mut packet = Packet::new(Code::AccountingRequest, id, [0u8; 16]);
        packet.add_attribute(Attribute::string(AttributeType::UserName as u8, "testuser").unwrap());
        packet.add_attribute(Attribute::integer(AttributeType::AcctStatusType as u8, 1).unwrap());
        packet.add_attribute(Attribute::string(AttributeType::AcctSessionId as u8, "abc123").unwrap());
        packet
    }

    async fn socket_pair() -> (UdpSocket, UdpSocket) {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        (server, client)
    }

    async fn try_recv(socket: &UdpSocket) -> Option<Vec<u8>> {
        let mut buf = [0u8; 4096];
        match tokio::time::timeout(Duration::from_millis(200), socket.recv_from(&mut buf)).await {
            Ok(Ok((len, _))) => Some(buf[..len].to_vec()),
            _ => None,
        }
    }

    #[tokio::test]
    async fn test_valid_request_is_stored_then_answered() {
        let store = Arc::new(RecordingStore::default());
        let handler = AccountingHandler::new(SECRET, store.clone());
        let (server, client) = socket_pair().await;

        let mut packet = request(42);
        let data = sign_accounting_request(&mut packet, SECRET).unwrap();

        handler
            .handle(&data, client.local_addr().unwrap(), &server)
            .await
            .unwrap();

        let saved = store.saved.lock().await;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].username, "testuser");
        assert_eq!(saved[0].acct_status_type, "Start");
        assert_eq!(saved[0].client_ip, "127.0.0.1");

        let reply = try_recv(&client).await.expect("no Accounting-Response");
        let response = Packet::decode(&reply).unwrap();
        assert_eq!(response.code, Code::AccountingResponse);
        assert_eq!(response.identifier, 42);
        assert_eq!(reply.len(), 20);
        assert!(verify_response_authenticator(&response, &packet.authenticator, SECRET));
    }

    #[tokio::test]
    async fn test_wrong_secret_is_dropped() {
        let store = Arc::new(RecordingStore::default());
        let handler = AccountingHandler::new(SECRET, store.clone());
        let (server, client) = socket_pair().await;

        let data = sign_accounting_request(&mut request(1), b"not-the-secret").unwrap();
        let result = handler.handle(&data, client.local_addr().unwrap(), &server).await;

        assert!(matches!(
            result,
            Err(ServerError::Decode(DecodeError::AuthenticationFailed))
        ));
        assert!(store.saved.lock().await.is_empty());
        assert!(try_recv(&client).await.is_none());
    }

    #[tokio::test]
    async fn test_access_request_is_ignored() {
        let store = Arc::new(RecordingStore::default());
        let handler = AccountingHandler::new(SECRET, store.clone());
        let (server, client) = socket_pair().await;

        let mut packet = Packet::new(Code::AccessRequest, 7, [1u8; 16]);
        packet.add_attribute(Attribute::string(AttributeType::UserName as u8, "testuser").unwrap());
        let data = packet.encode().unwrap();

        let result = handler.handle(&data, client.local_addr().unwrap(), &server).await;

        assert!(matches!(
            result,
            Err(ServerError::Decode(DecodeError::UnsupportedCode(1)))
        ));
        assert!(store.saved.lock().await.is_empty());
        assert!(try_recv(&client).await.is_none());
    }

    #[test]
    fn test_ignored_packet_is_logged_with_code() {
        let lines = capture_json_logs(|| {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async {
                let handler = AccountingHandler::new(SECRET, Arc::new(RecordingStore::default()));
                let (server, client) = socket_pair().await;
                let data = Packet::new(Code::AccessRequest, 7, [1u8; 16]).encode().unwrap();
                let _ = handler.handle(&data, client.local_addr().unwrap(), &server).await;
            });
        });

        let ignored: Vec<_> = lines
            .iter()
            .filter(|line| line["fields"]["message"] == "Ignoring non-accounting packet")
            .collect();
        assert_eq!(ignored.len(), 1);
        assert_eq!(ignored[0]["level"], "INFO");
        assert_eq!(ignored[0]["fields"]["code"], 1);
        assert!(ignored[0]["fields"]["client_addr"]
            .as_str()
            .unwrap()
            .starts_with("127.0.0.1:"));
    }

    #[tokio::test]
    async fn test_truncated_datagram_is_malformed() {
        let store = Arc::new(RecordingStore::default());
        let handler = AccountingHandler::new(SECRET, store.clone());
        let (server, client) = socket_pair().await;

        let data = sign_accounting_request(&mut request(3), SECRET).unwrap();
        let result = handler
            .handle(&data[..data.len() - 1], client.local_addr().unwrap(), &server)
            .await;

        assert!(matches!(result, Err(ServerError::Decode(DecodeError::Malformed(_)))));
        assert!(store.saved.lock().await.is_empty());
        assert!(try_recv(&client).await.is_none());
    }

    #[tokio::test]
    async fn test_store_failure_suppresses_response() {
        let handler = AccountingHandler::new(SECRET, Arc::new(FailingStore));
        let (server, client) = socket_pair().await;

        let data = sign_accounting_request(&mut request(9), SECRET).unwrap();
        let result = handler.handle(&data, client.local_addr().unwrap(), &server).await;

        assert!(matches!(result, Err(ServerError::Store(_))));
        assert!(try_recv(&client).await.is_none());
    }

    #[test]
    fn test_debug_hides_secret() {
        let handler = AccountingHandler::new(SECRET, Arc::new(FailingStore));
        let rendered = format!("{:?}", handler);
        assert!(!rendered.contains("testing123"));
    }
}
