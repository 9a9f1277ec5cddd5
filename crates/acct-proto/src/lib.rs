//! RADIUS Accounting Protocol Codec
//!
//! Wire handling for the accounting half of RADIUS (RFC 2865 framing,
//! RFC 2866 accounting).
//!
//! # Features
//!
//! - Packet and attribute encoding/decoding with strict length checks
//! - Accounting-Request authenticator verification (constant time)
//! - Accounting-Response authenticator calculation
//! - Typed attribute accessors that fall back to zero values
//!
//! # Example
//!
//! ```rust
//! use acct_proto::{Attribute, AttributeType, Code, Packet};
//! use acct_proto::codec::{decode_accounting_request, encode_accounting_response, sign_accounting_request};
//!
//! let secret = b"testing123";
//!
//! // Client: build and sign an Accounting-Request
//! let mut request = Packet::new(Code::AccountingRequest, 1, [0u8; 16]);
//! request.add_attribute(Attribute::string(AttributeType::UserName as u8, "alice").unwrap());
//! request.add_attribute(Attribute::integer(AttributeType::AcctStatusType as u8, 1).unwrap());
//! let bytes = sign_accounting_request(&mut request, secret).unwrap();
//!
//! // Server: authenticate it and answer
//! let packet = decode_accounting_request(&bytes, secret).unwrap();
//! assert_eq!(packet.string_attribute(AttributeType::UserName as u8), "alice");
//! let reply = encode_accounting_response(packet.identifier, &packet.authenticator, secret).unwrap();
//! assert_eq!(reply.len(), 20);
//! ```

pub mod accounting;
pub mod attributes;
pub mod auth;
pub mod codec;
pub mod packet;

pub use accounting::AcctStatusType;
pub use attributes::{Attribute, AttributeType};
pub use auth::{
    calculate_accounting_request_authenticator, calculate_response_authenticator,
    verify_accounting_request_authenticator, verify_response_authenticator,
};
pub use codec::{
    decode_accounting_request, encode_accounting_response, sign_accounting_request, DecodeError,
};
pub use packet::{Code, Packet, PacketError};
