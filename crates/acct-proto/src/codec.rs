//! Accounting request/response codec
//!
//! Server side: [`decode_accounting_request`] turns a datagram into a packet
//! whose authenticator has been checked against the shared secret, and
//! [`encode_accounting_response`] builds the matching reply.
//!
//! Client side: [`sign_accounting_request`] fills in a request authenticator.

use crate::auth::{
    calculate_accounting_request_authenticator, calculate_response_authenticator,
    verify_accounting_request_authenticator,
};
use crate::packet::{Code, Packet, PacketError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Malformed packet: {0}")]
    Malformed(PacketError),
    /// Structurally valid but not an Accounting-Request
    #[error("Unsupported packet code: {0}")]
    UnsupportedCode(u8),
    #[error("Request authenticator mismatch")]
    AuthenticationFailed,
}

impl From<PacketError> for DecodeError {
    fn from(err: PacketError) -> Self {
        match err {
            PacketError::InvalidCode(code) => DecodeError::UnsupportedCode(code),
            other => DecodeError::Malformed(other),
        }
    }
}

/// Decode and authenticate an Accounting-Request.
///
/// Checks run in order: framing, packet code, request authenticator. Non
/// accounting packets are reported before the authenticator check because
/// their authenticators follow different rules.
pub fn decode_accounting_request(data: &[u8], secret: &[u8]) -> Result<Packet, DecodeError> {
    let packet = Packet::decode(data)?;

    if packet.code != Code::AccountingRequest {
        return Err(DecodeError::UnsupportedCode(packet.code.as_u8()));
    }

    if !verify_accounting_request_authenticator(&packet, secret) {
        return Err(DecodeError::AuthenticationFailed);
    }

    Ok(packet)
}

/// Build an attribute-less Accounting-Response for the request identified by
/// `identifier` and `request_authenticator`.
pub fn encode_accounting_response(
    identifier: u8,
    request_authenticator: &[u8; 16],
    secret: &[u8],
) -> Result<Vec<u8>, PacketError> {
    let mut response = Packet::new(Code::AccountingResponse, identifier, [0u8; 16]);
    response.authenticator =
        calculate_response_authenticator(&response, request_authenticator, secret)?;
    response.encode()
}

/// Set the request authenticator of an Accounting-Request and encode it
pub fn sign_accounting_request(packet: &mut Packet, secret: &[u8]) -> Result<Vec<u8>, PacketError> {
    packet.authenticator = calculate_accounting_request_authenticator(packet, secret)?;
    packet.encode()
}
