//! # XBee Frame Encoder
//!
//! Builds complete API frames (delimiter, length, data, checksum).

use bytes::{BufMut, Bytes, BytesMut};

use super::checksum::checksum;
use super::protocol::*;
use crate::error::Result;

/// Encode a frame into its complete wire form
///
/// # Returns
///
/// * `Bytes` - `0x7E`, big-endian length, frame type, data, checksum
///
/// # Examples
///
/// ```
/// use ship_link::xbee::encoder::encode_frame;
/// use ship_link::xbee::protocol::{XbeeFrame, API_TX_REQUEST_16};
///
/// let frame = XbeeFrame::new(API_TX_REQUEST_16, vec![0x01, 0x86, 0x21, 0x00, 0x02]).unwrap();
/// let bytes = encode_frame(&frame);
/// assert_eq!(&bytes[..4], &[0x7E, 0x00, 0x06, 0x01]);
/// ```
pub fn encode_frame(frame: &XbeeFrame) -> Bytes {
    let mut buf = BytesMut::with_capacity(FRAME_OVERHEAD + frame.length() as usize);
    buf.put_u8(START_DELIMITER);
    buf.put_u16(frame.length());

    // Checksum covers everything after the length field
    let body_start = buf.len();
    buf.put_u8(frame.frame_type);
    buf.put_slice(&frame.data);
    let crc = checksum(&buf[body_start..]);
    buf.put_u8(crc);

    buf.freeze()
}

/// Encode a 16-bit transmit request (API 0x01)
///
/// # Errors
///
/// Returns error if the payload does not fit the length field
pub fn encode_transmit_request(request: &TransmitRequest) -> Result<Bytes> {
    let mut data = Vec::with_capacity(TX_HEADER_LEN - 1 + request.payload.len());
    data.push(request.frame_id);
    data.extend_from_slice(&request.dest.to_bytes());
    data.push(request.options);
    data.extend_from_slice(&request.payload);

    let frame = XbeeFrame::new(API_TX_REQUEST_16, data)?;
    Ok(encode_frame(&frame))
}

/// Encode a 16-bit receive packet (API 0x81)
///
/// The ship never sends these; they are what the radio hands the host, and
/// are built here for peer simulation and tests.
pub fn encode_receive_packet(packet: &ReceivePacket) -> Result<Bytes> {
    let mut data = Vec::with_capacity(RX_HEADER_LEN - 1 + packet.payload.len());
    data.push(packet.frame_id);
    data.extend_from_slice(&packet.source.to_bytes());
    data.extend_from_slice(&packet.dest.to_bytes());
    data.push(packet.options);
    data.extend_from_slice(&packet.payload);

    let frame = XbeeFrame::new(API_RX_PACKET_16, data)?;
    Ok(encode_frame(&frame))
}
