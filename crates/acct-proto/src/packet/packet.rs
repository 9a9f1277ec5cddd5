use super::Code;
use crate::attributes::Attribute;
use std::net::Ipv4Addr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PacketError {
    #[error("Packet too short: {0} bytes (minimum 20)")]
    TooShort(usize),
    #[error("Length field {declared} does not match datagram size {received}")]
    LengthMismatch { declared: usize, received: usize },
    #[error("Invalid packet code: {0}")]
    InvalidCode(u8),
    #[error("Attribute error: {0}")]
    AttributeError(String),
    #[error("Packet too large: {0} bytes")]
    PacketTooLarge(usize),
}

/// RADIUS Packet structure as defined in RFC 2865 Section 3
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     Code      |  Identifier   |            Length             |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// |                         Authenticator                         |
/// |                                                               |
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |  Attributes ...
/// +-+-+-+-+-+-+-+-+-+-+-+-+-
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub code: Code,
    /// Matches a response to its request
    pub identifier: u8,
    pub authenticator: [u8; 16],
    pub attributes: Vec<Attribute>,
}

impl Packet {
    /// Header size: code + identifier + length + authenticator
    pub const MIN_PACKET_SIZE: usize = 20;
    /// RFC 2865 upper bound
    pub const MAX_PACKET_SIZE: usize = 4096;

    pub fn new(code: Code, identifier: u8, authenticator: [u8; 16]) -> Self {
        Packet {
            code,
            identifier,
            authenticator,
            attributes: Vec::new(),
        }
    }

    pub fn add_attribute(&mut self, attribute: Attribute) {
        self.attributes.push(attribute);
    }

    /// Encode packet to bytes using its own authenticator
    pub fn encode(&self) -> Result<Vec<u8>, PacketError> {
        self.encode_with_authenticator(&self.authenticator)
    }

    /// Encode packet to bytes with `authenticator` in the header slot.
    ///
    /// Authenticator computations hash the packet with a placeholder in that
    /// slot (zeros, or the request authenticator for responses).
    pub fn encode_with_authenticator(
        &self,
        authenticator: &[u8; 16],
    ) -> Result<Vec<u8>, PacketError> {
        let length = self.length();
        if length > Self::MAX_PACKET_SIZE {
            return Err(PacketError::PacketTooLarge(length));
        }

        let mut buffer = Vec::with_capacity(length);
        buffer.push(self.code.as_u8());
        buffer.push(self.identifier);
        buffer.extend_from_slice(&(length as u16).to_be_bytes());
        buffer.extend_from_slice(authenticator);

        for attr in &self.attributes {
            attr.encode_into(&mut buffer)?;
        }

        Ok(buffer)
    }

    /// Decode a packet from a complete datagram.
    ///
    /// The declared length must equal the datagram size exactly; trailing or
    /// missing bytes are both malformed.
    pub fn decode(data: &[u8]) -> Result<Self, PacketError> {
        if data.len() < Self::MIN_PACKET_SIZE {
            return Err(PacketError::TooShort(data.len()));
        }
        if data.len() > Self::MAX_PACKET_SIZE {
            return Err(PacketError::PacketTooLarge(data.len()));
        }

        let declared = u16::from_be_bytes([data[2], data[3]]) as usize;
        if declared != data.len() {
            return Err(PacketError::LengthMismatch {
                declared,
                received: data.len(),
            });
        }

        let code = Code::from_u8(data[0]).ok_or(PacketError::InvalidCode(data[0]))?;
        let identifier = data[1];

        let mut authenticator = [0u8; 16];
        authenticator.copy_from_slice(&data[4..Self::MIN_PACKET_SIZE]);

        let mut attributes = Vec::new();
        let mut rest = &data[Self::MIN_PACKET_SIZE..];
        while !rest.is_empty() {
            let attr = Attribute::decode(rest)?;
            rest = &rest[attr.encoded_length()..];
            attributes.push(attr);
        }

        Ok(Packet {
            code,
            identifier,
            authenticator,
            attributes,
        })
    }

    /// Length of the encoded packet
    pub fn length(&self) -> usize {
        Self::MIN_PACKET_SIZE
            + self
                .attributes
                .iter()
                .map(Attribute::encoded_length)
                .sum::<usize>()
    }

    /// Find first attribute by type
    pub fn find_attribute(&self, attr_type: u8) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.attr_type == attr_type)
    }

    /// String value of the first `attr_type` attribute, or `""` when absent.
    ///
    /// Invalid UTF-8 is replaced rather than rejected.
    pub fn string_attribute(&self, attr_type: u8) -> String {
        self.find_attribute(attr_type)
            .map(|a| String::from_utf8_lossy(&a.value).into_owned())
            .unwrap_or_default()
    }

    /// 32-bit integer value of the first `attr_type` attribute, or `0` when
    /// absent or not exactly four bytes wide.
    pub fn integer_attribute(&self, attr_type: u8) -> u32 {
        self.find_attribute(attr_type)
            .and_then(|a| a.as_integer().ok())
            .unwrap_or(0)
    }

    /// IPv4 value of the first `attr_type` attribute, or `0.0.0.0` when
    /// absent or not exactly four bytes wide.
    pub fn ipv4_attribute(&self, attr_type: u8) -> Ipv4Addr {
        self.find_attribute(attr_type)
            .and_then(|a| a.as_ipv4().ok())
            .map(Ipv4Addr::from)
            .unwrap_or(Ipv4Addr::UNSPECIFIED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeType;

    fn accounting_packet() -> Packet {
        let mut packet = Packet::new(Code::AccountingRequest, 42, [0u8; 16]);
        packet.add_attribute(Attribute::string(AttributeType::UserName as u8, "testuser").unwrap());
        packet.add_attribute(Attribute::integer(AttributeType::NasPort as u8, 7).unwrap());
        packet.add_attribute(
            Attribute::ipv4(AttributeType::NasIpAddress as u8, [192, 168, 1, 1]).unwrap(),
        );
        packet
    }

    #[test]
    fn test_packet_encode_decode() {
        let packet = accounting_packet();
        let encoded = packet.encode().unwrap();
        assert_eq!(encoded.len(), packet.length());
        assert_eq!(u16::from_be_bytes([encoded[2], encoded[3]]) as usize, encoded.len());

        let decoded = Packet::decode(&encoded).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_packet_min_size() {
        let data = vec![0u8; 19];
        assert_eq!(Packet::decode(&data), Err(PacketError::TooShort(19)));
    }

    #[test]
    fn test_declared_length_must_match_datagram() {
        let mut encoded = accounting_packet().encode().unwrap();

        let mut trailing = encoded.clone();
        trailing.push(0);
        assert!(matches!(
            Packet::decode(&trailing),
            Err(PacketError::LengthMismatch { .. })
        ));

        encoded.truncate(encoded.len() - 1);
        assert!(matches!(
            Packet::decode(&encoded),
            Err(PacketError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_declared_length_below_header_is_rejected() {
        let mut encoded = Packet::new(Code::AccountingRequest, 1, [0u8; 16])
            .encode()
            .unwrap();
        encoded[2] = 0;
        encoded[3] = 4;
        assert!(Packet::decode(&encoded).is_err());
    }

    #[test]
    fn test_unknown_code_reported() {
        let mut encoded = Packet::new(Code::AccountingRequest, 1, [0u8; 16])
            .encode()
            .unwrap();
        encoded[0] = 42;
        assert_eq!(Packet::decode(&encoded), Err(PacketError::InvalidCode(42)));
    }

    #[test]
    fn test_truncated_attribute_rejected() {
        let mut encoded = Packet::new(Code::AccountingRequest, 1, [0u8; 16])
            .encode()
            .unwrap();
        // Type 1 claims 10 bytes but only 4 follow the header
        encoded.extend_from_slice(&[1, 10, b'a', b'b']);
        let len = encoded.len() as u16;
        encoded[2..4].copy_from_slice(&len.to_be_bytes());
        assert!(matches!(
            Packet::decode(&encoded),
            Err(PacketError::AttributeError(_))
        ));
    }

    #[test]
    fn test_zero_length_attribute_rejected() {
        let mut encoded = Packet::new(Code::AccountingRequest, 1, [0u8; 16])
            .encode()
            .unwrap();
        encoded.extend_from_slice(&[1, 0]);
        let len = encoded.len() as u16;
        encoded[2..4].copy_from_slice(&len.to_be_bytes());
        assert!(Packet::decode(&encoded).is_err());
    }

    #[test]
    fn test_typed_accessors() {
        let packet = accounting_packet();
        assert_eq!(packet.string_attribute(AttributeType::UserName as u8), "testuser");
        assert_eq!(packet.integer_attribute(AttributeType::NasPort as u8), 7);
        assert_eq!(
            packet.ipv4_attribute(AttributeType::NasIpAddress as u8),
            Ipv4Addr::new(192, 168, 1, 1)
        );
    }

    #[test]
    fn test_missing_attributes_yield_zero_values() {
        let packet = Packet::new(Code::AccountingRequest, 1, [0u8; 16]);
        assert_eq!(packet.string_attribute(AttributeType::AcctSessionId as u8), "");
        assert_eq!(packet.integer_attribute(AttributeType::AcctStatusType as u8), 0);
        assert_eq!(
            packet.ipv4_attribute(AttributeType::FramedIpAddress as u8),
            Ipv4Addr::UNSPECIFIED
        );
    }

    #[test]
    fn test_wrong_width_integer_yields_zero() {
        let mut packet = Packet::new(Code::AccountingRequest, 1, [0u8; 16]);
        packet.add_attribute(Attribute::new(AttributeType::NasPort as u8, vec![1, 2]).unwrap());
        assert_eq!(packet.integer_attribute(AttributeType::NasPort as u8), 0);
    }

    #[test]
    fn test_wrong_width_ipv4_yields_unspecified() {
        let mut packet = Packet::new(Code::AccountingRequest, 1, [0u8; 16]);
        packet.add_attribute(
            Attribute::new(AttributeType::FramedIpAddress as u8, vec![10, 0, 0]).unwrap(),
        );
        packet.add_attribute(Attribute::ipv4(AttributeType::NasIpAddress as u8, [10, 1, 1, 1]).unwrap());

        assert_eq!(
            packet.ipv4_attribute(AttributeType::FramedIpAddress as u8),
            Ipv4Addr::UNSPECIFIED
        );
        assert_eq!(
            packet.ipv4_attribute(AttributeType::NasIpAddress as u8),
            Ipv4Addr::new(10, 1, 1, 1)
        );
    }
}
