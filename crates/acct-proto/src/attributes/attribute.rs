use crate::packet::PacketError;

/// RADIUS Attribute structure as defined in RFC 2865 Section 5
///
/// ```text
///  0                   1                   2
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     Type      |    Length     |  Value ...
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// The length octet counts the two header bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub attr_type: u8,
    pub value: Vec<u8>,
}

impl Attribute {
    /// Type + length octets
    pub const HEADER_LENGTH: usize = 2;
    pub const MAX_LENGTH: usize = 255;
    pub const MAX_VALUE_LENGTH: usize = Self::MAX_LENGTH - Self::HEADER_LENGTH;

    pub fn new(attr_type: u8, value: Vec<u8>) -> Result<Self, PacketError> {
        if value.len() > Self::MAX_VALUE_LENGTH {
            return Err(PacketError::AttributeError(format!(
                "Attribute {} value too long: {} bytes (max {})",
                attr_type,
                value.len(),
                Self::MAX_VALUE_LENGTH
            )));
        }
        Ok(Attribute { attr_type, value })
    }

    pub fn string(attr_type: u8, value: impl Into<String>) -> Result<Self, PacketError> {
        Self::new(attr_type, value.into().into_bytes())
    }

    /// 32-bit big-endian integer attribute
    pub fn integer(attr_type: u8, value: u32) -> Result<Self, PacketError> {
        Self::new(attr_type, value.to_be_bytes().to_vec())
    }

    pub fn ipv4(attr_type: u8, value: [u8; 4]) -> Result<Self, PacketError> {
        Self::new(attr_type, value.to_vec())
    }

    /// Append the wire form of this attribute to `buffer`
    pub fn encode_into(&self, buffer: &mut Vec<u8>) -> Result<(), PacketError> {
        let length = self.encoded_length();
        if length > Self::MAX_LENGTH {
            return Err(PacketError::AttributeError(format!(
                "Encoded attribute {} too long: {} bytes",
                self.attr_type, length
            )));
        }

        buffer.push(self.attr_type);
        buffer.push(length as u8);
        buffer.extend_from_slice(&self.value);
        Ok(())
    }

    /// Decode the attribute at the front of `data`.
    ///
    /// Trailing bytes after the attribute are left for the caller.
    pub fn decode(data: &[u8]) -> Result<Self, PacketError> {
        if data.len() < Self::HEADER_LENGTH {
            return Err(PacketError::AttributeError(format!(
                "Attribute header truncated: {} bytes",
                data.len()
            )));
        }

        let attr_type = data[0];
        let length = data[1] as usize;

        if length < Self::HEADER_LENGTH {
            return Err(PacketError::AttributeError(format!(
                "Invalid length {} for attribute {}",
                length, attr_type
            )));
        }

        if data.len() < length {
            return Err(PacketError::AttributeError(format!(
                "Attribute {} truncated: expected {} bytes, got {}",
                attr_type,
                length,
                data.len()
            )));
        }

        Ok(Attribute {
            attr_type,
            value: data[Self::HEADER_LENGTH..length].to_vec(),
        })
    }

    pub fn encoded_length(&self) -> usize {
        Self::HEADER_LENGTH + self.value.len()
    }

    /// Value as a 32-bit big-endian integer
    pub fn as_integer(&self) -> Result<u32, PacketError> {
        let bytes: [u8; 4] = self.value.as_slice().try_into().map_err(|_| {
            PacketError::AttributeError(format!(
                "Expected 4 bytes for integer, got {}",
                self.value.len()
            ))
        })?;
        Ok(u32::from_be_bytes(bytes))
    }

    pub fn as_ipv4(&self) -> Result<[u8; 4], PacketError> {
        self.value.as_slice().try_into().map_err(|_| {
            PacketError::AttributeError(format!(
                "Expected 4 bytes for IPv4, got {}",
                self.value.len()
            ))
        })
    }
}
