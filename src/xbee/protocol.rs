//! # XBee API Protocol Constants and Types
//!
//! Core frame definitions for XBee API mode (non-escaped, `AP=1`).
//!
//! ```text
//! 0x7E | LEN_HI LEN_LO | TYPE | ... frame data ... | CHECKSUM
//!        '---- counts TYPE through end of frame data ----'
//! ```

use std::fmt;

use crate::error::{Result, ShipLinkError};

/// Frame start delimiter (always 0x7E)
pub const START_DELIMITER: u8 = 0x7E;

/// Transmit request, 16-bit destination address (host -> radio)
pub const API_TX_REQUEST_16: u8 = 0x01;

/// Receive packet, 16-bit source address (radio -> host)
pub const API_RX_PACKET_16: u8 = 0x81;

/// Transmit header: type(1) + frame id(1) + destination(2) + options(1)
pub const TX_HEADER_LEN: usize = 5;

/// Receive header: type(1) + frame id(1) + source(2) + destination(2) + options(1)
pub const RX_HEADER_LEN: usize = 7;

/// Default options byte for outbound frames (radio ACK enabled)
pub const OPTIONS_DEFAULT: u8 = 0x00;

/// Default cap on the declared length field, sized to the firmware receive buffer
pub const DEFAULT_MAX_FRAME_LENGTH: u16 = 100;

/// Bytes outside the length-counted region: start(1) + length(2) + checksum(1)
pub const FRAME_OVERHEAD: usize = 4;

/// 16-bit XBee device address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub u16);

impl Address {
    /// Build an address from its big-endian wire bytes
    pub const fn from_bytes(msb: u8, lsb: u8) -> Self {
        Self(u16::from_be_bytes([msb, lsb]))
    }

    /// Big-endian wire bytes
    pub const fn to_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

impl From<u16> for Address {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

/// A checksum-verified XBee API frame
///
/// `data` holds everything after the frame type byte up to the checksum,
/// i.e. the header fields of the particular API frame followed by the
/// RF payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XbeeFrame {
    /// API identifier
    pub frame_type: u8,

    /// Frame-specific data (header fields + payload)
    pub data: Vec<u8>,
}

impl XbeeFrame {
    /// Create a new XBee frame
    ///
    /// # Errors
    ///
    /// Returns error if the frame would not fit the 16-bit length field
    pub fn new(frame_type: u8, data: Vec<u8>) -> Result<Self> {
        if data.len() + 1 > u16::MAX as usize {
            return Err(ShipLinkError::Protocol(format!(
                "Frame data size {} exceeds maximum {}",
                data.len(),
                u16::MAX as usize - 1
            )));
        }

        Ok(Self { frame_type, data })
    }

    /// Value of the length field (type + data)
    ///
    /// Cannot overflow since `new` bounds the data size.
    pub fn length(&self) -> u16 {
        (1 + self.data.len()) as u16
    }
}

/// Outbound transmit request (API 0x01)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmitRequest {
    pub frame_id: u8,
    pub dest: Address,
    pub options: u8,
    pub payload: Vec<u8>,
}

impl TransmitRequest {
    /// Interpret a decoded frame as a transmit request
    pub fn parse(frame: &XbeeFrame) -> Result<Self> {
        if frame.frame_type != API_TX_REQUEST_16 {
            return Err(ShipLinkError::Protocol(format!(
                "Not a transmit request: 0x{:02X}",
                frame.frame_type
            )));
        }
        let d = &frame.data;
        if d.len() < TX_HEADER_LEN - 1 {
            return Err(ShipLinkError::Protocol(format!(
                "Transmit request too short: {} bytes",
                d.len()
            )));
        }

        Ok(Self {
            frame_id: d[0],
            dest: Address::from_bytes(d[1], d[2]),
            options: d[3],
            payload: d[4..].to_vec(),
        })
    }
}

/// Inbound receive packet (API 0x81)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivePacket {
    /// Frame id slot; carries the RSSI reading on receive frames
    pub frame_id: u8,
    pub source: Address,
    pub dest: Address,
    pub options: u8,
    pub payload: Vec<u8>,
}

impl ReceivePacket {
    /// Interpret a decoded frame as a receive packet
    pub fn parse(frame: &XbeeFrame) -> Result<Self> {
        if frame.frame_type != API_RX_PACKET_16 {
            return Err(ShipLinkError::Protocol(format!(
                "Not a receive packet: 0x{:02X}",
                frame.frame_type
            )));
        }
        let d = &frame.data;
        if d.len() < RX_HEADER_LEN - 1 {
            return Err(ShipLinkError::Protocol(format!(
                "Receive packet too short: {} bytes",
                d.len()
            )));
        }

        Ok(Self {
            frame_id: d[0],
            source: Address::from_bytes(d[1], d[2]),
            dest: Address::from_bytes(d[3], d[4]),
            options: d[5],
            payload: d[6..].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_constants() {
        assert_eq!(START_DELIMITER, 0x7E);
        assert_eq!(API_TX_REQUEST_16, 0x01);
        assert_eq!(API_RX_PACKET_16, 0x81);
        assert_eq!(DEFAULT_MAX_FRAME_LENGTH, 100);
    }

    #[test]
    fn test_address_bytes() {
        let addr = Address::from_bytes(0x86, 0x21);
        assert_eq!(addr, Address(0x8621));
        assert_eq!(addr.to_bytes(), [0x86, 0x21]);
        assert_eq!(addr.to_string(), "0x8621");
    }

    #[test]
    fn test_frame_length() {
        let frame = XbeeFrame::new(API_TX_REQUEST_16, vec![0u8; 6]).unwrap();
        assert_eq!(frame.length(), 7); // type + 6 data bytes
    }

    #[test]
    fn test_frame_too_large() {
        let result = XbeeFrame::new(API_TX_REQUEST_16, vec![0u8; u16::MAX as usize]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_receive_packet() {
        let frame = XbeeFrame::new(
            API_RX_PACKET_16,
            vec![0x28, 0x86, 0x21, 0x20, 0x86, 0x00, 0x01, 0x01],
        )
        .unwrap();

        let packet = ReceivePacket::parse(&frame).unwrap();
        assert_eq!(packet.frame_id, 0x28);
        assert_eq!(packet.source, Address(0x8621));
        assert_eq!(packet.dest, Address(0x2086));
        assert_eq!(packet.options, 0x00);
        assert_eq!(packet.payload, vec![0x01, 0x01]);
    }

    #[test]
    fn test_parse_receive_packet_wrong_type() {
        let frame = XbeeFrame::new(API_TX_REQUEST_16, vec![0u8; 8]).unwrap();
        assert!(ReceivePacket::parse(&frame).is_err());
    }

    #[test]
    fn test_parse_receive_packet_truncated_header() {
        let frame = XbeeFrame::new(API_RX_PACKET_16, vec![0x28, 0x86, 0x21]).unwrap();
        assert!(ReceivePacket::parse(&frame).is_err());
    }

    #[test]
    fn test_parse_transmit_request_empty_payload() {
        let frame = XbeeFrame::new(API_TX_REQUEST_16, vec![0x01, 0x86, 0x21, 0x00]).unwrap();
        let request = TransmitRequest::parse(&frame).unwrap();
        assert_eq!(request.dest, Address(0x8621));
        assert!(request.payload.is_empty());
    }
}
