//! Acct-Status-Type dictionary (RFC 2866 Section 5.1, RFC 2867 Section 4.1)
//!
//! # Example
//!
//! ```rust
//! use acct_proto::accounting::AcctStatusType;
//!
//! assert_eq!(AcctStatusType::from_u32(3), Some(AcctStatusType::InterimUpdate));
//! assert_eq!(AcctStatusType::describe(3), "Interim-Update");
//! assert_eq!(AcctStatusType::describe(99), "AcctStatusType(99)");
//! ```

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum AcctStatusType {
    /// Session has begun
    Start = 1,
    /// Session has ended
    Stop = 2,
    /// Periodic update during a session
    InterimUpdate = 3,
    /// NAS is ready
    AccountingOn = 7,
    /// NAS is shutting down
    AccountingOff = 8,
    TunnelStart = 9,
    TunnelStop = 10,
    TunnelReject = 11,
    TunnelLinkStart = 12,
    TunnelLinkStop = 13,
    TunnelLinkReject = 14,
    Failed = 15,
}

impl AcctStatusType {
    pub fn from_u32(value: u32) -> Option<Self> {
        use AcctStatusType::*;
        let status = match value {
            1 => Start,
            2 => Stop,
            3 => InterimUpdate,
            7 => AccountingOn,
            8 => AccountingOff,
            9 => TunnelStart,
            10 => TunnelStop,
            11 => TunnelReject,
            12 => TunnelLinkStart,
            13 => TunnelLinkStop,
            14 => TunnelLinkReject,
            15 => Failed,
            _ => return None,
        };
        Some(status)
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        use AcctStatusType::*;
        match self {
            Start => "Start",
            Stop => "Stop",
            InterimUpdate => "Interim-Update",
            AccountingOn => "Accounting-On",
            AccountingOff => "Accounting-Off",
            TunnelStart => "Tunnel-Start",
            TunnelStop => "Tunnel-Stop",
            TunnelReject => "Tunnel-Reject",
            TunnelLinkStart => "Tunnel-Link-Start",
            TunnelLinkStop => "Tunnel-Link-Stop",
            TunnelLinkReject => "Tunnel-Link-Reject",
            Failed => "Failed",
        }
    }

    /// Dictionary name for a raw attribute value.
    ///
    /// Values outside the dictionary (including the `0` an absent attribute
    /// decodes to) render as `AcctStatusType(<n>)`.
    pub fn describe(value: u32) -> String {
        match Self::from_u32(value) {
            Some(status) => status.name().to_string(),
            None => format!("AcctStatusType({})", value),
        }
    }
}

impl fmt::Display for AcctStatusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acct_status_type_conversion() {
        assert_eq!(AcctStatusType::Start.as_u32(), 1);
        assert_eq!(AcctStatusType::from_u32(2), Some(AcctStatusType::Stop));
        assert_eq!(AcctStatusType::from_u32(15), Some(AcctStatusType::Failed));
        assert_eq!(AcctStatusType::from_u32(4), None);
    }

    #[test]
    fn test_names() {
        assert_eq!(AcctStatusType::describe(1), "Start");
        assert_eq!(AcctStatusType::describe(2), "Stop");
        assert_eq!(AcctStatusType::describe(3), "Interim-Update");
        assert_eq!(AcctStatusType::describe(8), "Accounting-Off");
        assert_eq!(AcctStatusType::TunnelLinkStart.to_string(), "Tunnel-Link-Start");
    }

    #[test]
    fn test_absent_or_unknown_value() {
        assert_eq!(AcctStatusType::describe(0), "AcctStatusType(0)");
        assert_eq!(AcctStatusType::describe(200), "AcctStatusType(200)");
    }
}
