/// Attribute type numbers carried by accounting traffic (RFC 2865, RFC 2866, RFC 2869)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AttributeType {
    UserName = 1,
    NasIpAddress = 4,
    NasPort = 5,
    ServiceType = 6,
    FramedProtocol = 7,
    FramedIpAddress = 8,
    Class = 25,
    SessionTimeout = 27,
    IdleTimeout = 28,
    CalledStationId = 30,
    CallingStationId = 31,
    NasIdentifier = 32,
    ProxyState = 33,
    AcctStatusType = 40,
    AcctDelayTime = 41,
    AcctInputOctets = 42,
    AcctOutputOctets = 43,
    AcctSessionId = 44,
    AcctAuthentic = 45,
    AcctSessionTime = 46,
    AcctInputPackets = 47,
    AcctOutputPackets = 48,
    AcctTerminateCause = 49,
    AcctMultiSessionId = 50,
    AcctLinkCount = 51,
    /// High 32 bits of the input octet counter (RFC 2869)
    AcctInputGigawords = 52,
    /// High 32 bits of the output octet counter (RFC 2869)
    AcctOutputGigawords = 53,
    NasPortType = 61,
}

impl AttributeType {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_numbers() {
        assert_eq!(AttributeType::UserName.as_u8(), 1);
        assert_eq!(AttributeType::NasIpAddress.as_u8(), 4);
        assert_eq!(AttributeType::AcctStatusType.as_u8(), 40);
        assert_eq!(AttributeType::AcctSessionId.as_u8(), 44);
        assert_eq!(AttributeType::NasPortType.as_u8(), 61);
    }
}
