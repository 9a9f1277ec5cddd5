//! Normalized accounting record persisted for every Accounting-Request

use acct_proto::{AcctStatusType, AttributeType, Packet};
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Value of [`AccountingRecord::packet_type`] for records built from
/// Accounting-Request packets
pub const ACCOUNTING_REQUEST: &str = "Accounting-Request";

/// One accounting event as stored and logged.
///
/// `timestamp` and `client_ip` are observed by the server (receive time and
/// datagram source) and never taken from packet attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountingRecord {
    pub username: String,
    pub nas_ip_address: String,
    pub nas_port: u32,
    pub acct_status_type: String,
    pub acct_session_id: String,
    pub framed_ip_address: String,
    pub calling_station_id: String,
    pub called_station_id: String,
    /// Receive time, UTC, microsecond precision
    pub timestamp: DateTime<Utc>,
    pub client_ip: String,
    pub packet_type: String,
}

impl AccountingRecord {
    /// Build a record from an authenticated Accounting-Request.
    ///
    /// Missing attributes become empty strings, `0` or `0.0.0.0`.
    pub fn from_packet(packet: &Packet, client_ip: IpAddr, received_at: DateTime<Utc>) -> Self {
        let status = packet.integer_attribute(AttributeType::AcctStatusType as u8);

        AccountingRecord {
            username: packet.string_attribute(AttributeType::UserName as u8),
            nas_ip_address: packet
                .ipv4_attribute(AttributeType::NasIpAddress as u8)
                .to_string(),
            nas_port: packet.integer_attribute(AttributeType::NasPort as u8),
            acct_status_type: AcctStatusType::describe(status),
            acct_session_id: packet.string_attribute(AttributeType::AcctSessionId as u8),
            framed_ip_address: packet
                .ipv4_attribute(AttributeType::FramedIpAddress as u8)
                .to_string(),
            calling_station_id: packet.string_attribute(AttributeType::CallingStationId as u8),
            called_station_id: packet.string_attribute(AttributeType::CalledStationId as u8),
            timestamp: received_at.trunc_subsecs(6),
            client_ip: client_ip.to_string(),
            packet_type: ACCOUNTING_REQUEST.to_string(),
        }
    }
}
