use crate::packet::{Packet, PacketError};
use subtle::ConstantTimeEq;

fn md5_with_secret(mut data: Vec<u8>, secret: &[u8]) -> [u8; 16] {
    data.extend_from_slice(secret);
    md5::compute(&data).0
}

/// Calculate the Request Authenticator of an Accounting-Request (RFC 2866 Section 3)
///
/// Request Authenticator = MD5(Code + ID + Length + 16 zero octets + Attributes + Secret)
///
/// Unlike Access-Request, the accounting authenticator is not random: it is
/// derived from the packet itself, which is what lets the server check it.
pub fn calculate_accounting_request_authenticator(
    packet: &Packet,
    secret: &[u8],
) -> Result<[u8; 16], PacketError> {
    let data = packet.encode_with_authenticator(&[0u8; 16])?;
    Ok(md5_with_secret(data, secret))
}

/// Check an Accounting-Request's authenticator against `secret`.
///
/// The comparison runs in constant time.
pub fn verify_accounting_request_authenticator(packet: &Packet, secret: &[u8]) -> bool {
    match calculate_accounting_request_authenticator(packet, secret) {
        Ok(expected) => expected[..].ct_eq(&packet.authenticator[..]).into(),
        Err(_) => false,
    }
}

/// Calculate Response Authenticator per RFC 2865 Section 3
///
/// Response Authenticator = MD5(Code + ID + Length + Request Authenticator + Attributes + Secret)
pub fn calculate_response_authenticator(
    packet: &Packet,
    request_authenticator: &[u8; 16],
    secret: &[u8],
) -> Result<[u8; 16], PacketError> {
    let data = packet.encode_with_authenticator(request_authenticator)?;
    Ok(md5_with_secret(data, secret))
}

/// Verify that `response` answers the request carrying `request_authenticator`
pub fn verify_response_authenticator(
    response: &Packet,
    request_authenticator: &[u8; 16],
    secret: &[u8],
) -> bool {
    match calculate_response_authenticator(response, request_authenticator, secret) {
        Ok(expected) => expected[..].ct_eq(&response.authenticator[..]).into(),
        Err(_) => false,
    }
}
