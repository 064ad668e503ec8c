//! # XBee Frame Decoder
//!
//! Incremental, byte-at-a-time frame parser. The decoder keeps exactly one
//! partial frame and reports a result for every byte it is fed.

use bytes::BytesMut;

use super::checksum::ChecksumAccumulator;
use super::protocol::*;
use crate::error::{LinkError, Result, ShipLinkError};

/// Receive phase of the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RxState {
    /// Hunting for the 0x7E delimiter
    #[default]
    WaitingForStart,
    /// Delimiter seen, next byte is the length MSB
    WaitingForLengthHigh,
    /// Next byte is the length LSB
    WaitingForLengthLow,
    /// Collecting the length-counted bytes
    ReceivingPayload,
    /// Next byte is the checksum
    ReceivingChecksum,
}

/// Outcome of feeding one byte
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feed {
    /// More bytes needed
    Incomplete,
    /// A complete, checksum-valid frame
    Frame(XbeeFrame),
    /// The partial frame was discarded
    Error(LinkError),
}

/// Incremental XBee API frame decoder
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    state: RxState,
    buf: BytesMut,
    declared: u16,
    max_length: u16,
    checksum: ChecksumAccumulator,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_LENGTH)
    }
}

impl FrameDecoder {
    /// Create a decoder that rejects declared lengths above `max_length`
    pub fn new(max_length: u16) -> Self {
        Self {
            state: RxState::WaitingForStart,
            buf: BytesMut::with_capacity(max_length as usize),
            declared: 0,
            max_length,
            checksum: ChecksumAccumulator::new(),
        }
    }

    /// Current receive phase
    pub fn state(&self) -> RxState {
        self.state
    }

    /// Maximum accepted length field
    pub fn max_length(&self) -> u16 {
        self.max_length
    }

    /// Drop any partial frame and go back to hunting for a delimiter
    pub fn reset(&mut self) {
        self.state = RxState::WaitingForStart;
        self.buf.clear();
        self.declared = 0;
        self.checksum.reset();
    }

    /// Feed one received byte
    pub fn feed(&mut self, byte: u8) -> Feed {
        match self.state {
            RxState::WaitingForStart => {
                if byte == START_DELIMITER {
                    self.reset();
                    self.state = RxState::WaitingForLengthHigh;
                }
                Feed::Incomplete
            }
            RxState::WaitingForLengthHigh => {
                self.declared = u16::from(byte) << 8;
                self.state = RxState::WaitingForLengthLow;
                Feed::Incomplete
            }
            RxState::WaitingForLengthLow => {
                self.declared |= u16::from(byte);
                let declared = self.declared;

                if declared == 0 {
                    self.reset();
                    return Feed::Error(LinkError::EmptyFrame);
                }
                if declared > self.max_length {
                    self.reset();
                    return Feed::Error(LinkError::LengthOverflow {
                        declared,
                        max: self.max_length,
                    });
                }

                self.state = RxState::ReceivingPayload;
                Feed::Incomplete
            }
            RxState::ReceivingPayload => {
                self.buf.extend_from_slice(&[byte]);
                self.checksum.push(byte);
                if self.buf.len() == self.declared as usize {
                    self.state = RxState::ReceivingChecksum;
                }
                Feed::Incomplete
            }
            RxState::ReceivingChecksum => {
                let result = if self.checksum.verify(byte) {
                    let mut body = self.buf.split();
                    let frame_type = body[0];
                    let data = body.split_off(1).to_vec();
                    Feed::Frame(XbeeFrame { frame_type, data })
                } else {
                    Feed::Error(LinkError::ChecksumMismatch {
                        expected: self.checksum.expected(),
                        actual: byte,
                    })
                };
                self.reset();
                result
            }
        }
    }
}

/// Decode one complete frame from a buffer
///
/// # Errors
///
/// Returns error if:
/// - The buffer does not start with the delimiter
/// - Any link error occurs while decoding
/// - The buffer ends before the frame does
pub fn decode_frame(bytes: &[u8]) -> Result<XbeeFrame> {
    match bytes.first() {
        Some(&START_DELIMITER) => {}
        Some(&other) => {
            return Err(ShipLinkError::Protocol(format!(
                "Invalid start delimiter: 0x{:02X}",
                other
            )))
        }
        None => return Err(ShipLinkError::Protocol("Frame too short".to_string())),
    }

    let mut decoder = FrameDecoder::new(u16::MAX);
    for &byte in bytes {
        match decoder.feed(byte) {
            Feed::Incomplete => continue,
            Feed::Frame(frame) => return Ok(frame),
            Feed::Error(e) => return Err(ShipLinkError::Protocol(e.to_string())),
        }
    }

    Err(ShipLinkError::Protocol(format!(
        "Frame too short: ended in {:?} after {} bytes",
        decoder.state(),
        bytes.len()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xbee::encoder::{encode_receive_packet, encode_transmit_request};
    use proptest::prelude::*;

    fn control_packet() -> ReceivePacket {
        ReceivePacket {
            frame_id: 0x30,
            source: Address(0x8621),
            dest: Address(0x2086),
            options: 0x00,
            payload: vec![0x03, 0x01, 0x00, 0x00, 0x00, 0x00],
        }
    }

    fn feed_all(decoder: &mut FrameDecoder, bytes: &[u8]) -> Vec<Feed> {
        bytes.iter().map(|&b| decoder.feed(b)).collect()
    }

    #[test]
    fn test_state_progression() {
        let bytes = encode_receive_packet(&control_packet()).unwrap();
        let mut decoder = FrameDecoder::default();

        assert_eq!(decoder.state(), RxState::WaitingForStart);
        decoder.feed(bytes[0]);
        assert_eq!(decoder.state(), RxState::WaitingForLengthHigh);
        decoder.feed(bytes[1]);
        assert_eq!(decoder.state(), RxState::WaitingForLengthLow);
        decoder.feed(bytes[2]);
        assert_eq!(decoder.state(), RxState::ReceivingPayload);
        for &b in &bytes[3..bytes.len() - 1] {
            decoder.feed(b);
        }
        assert_eq!(decoder.state(), RxState::ReceivingChecksum);

        let last = decoder.feed(bytes[bytes.len() - 1]);
        assert!(matches!(last, Feed::Frame(_)));
        assert_eq!(decoder.state(), RxState::WaitingForStart);
    }

    #[test]
    fn test_only_last_byte_completes_frame() {
        let bytes = encode_receive_packet(&control_packet()).unwrap();
        let mut decoder = FrameDecoder::default();
        let results = feed_all(&mut decoder, &bytes);

        let (last, rest) = results.split_last().unwrap();
        assert!(rest.iter().all(|r| *r == Feed::Incomplete));
        match last {
            Feed::Frame(frame) => {
                assert_eq!(frame.frame_type, API_RX_PACKET_16);
                let packet = ReceivePacket::parse(frame).unwrap();
                assert_eq!(packet, control_packet());
            }
            other => panic!("Expected frame, got {:?}", other),
        }
    }

    #[test]
    fn test_garbage_before_start_is_skipped() {
        let bytes = encode_receive_packet(&control_packet()).unwrap();
        let mut stream = vec![0x00, 0x13, 0xFF];
        stream.extend_from_slice(&bytes);

        let mut decoder = FrameDecoder::default();
        let frames: Vec<_> = feed_all(&mut decoder, &stream)
            .into_iter()
            .filter(|r| matches!(r, Feed::Frame(_)))
            .collect();
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn test_delimiter_value_inside_payload_is_data() {
        let mut packet = control_packet();
        packet.payload = vec![0x03, START_DELIMITER, 0x7E, 0x00, 0x00, 0x00];
        let bytes = encode_receive_packet(&packet).unwrap();

        let mut decoder = FrameDecoder::default();
        match feed_all(&mut decoder, &bytes).pop() {
            Some(Feed::Frame(frame)) => {
                assert_eq!(ReceivePacket::parse(&frame).unwrap().payload, packet.payload);
            }
            other => panic!("Expected frame, got {:?}", other),
        }
    }

    #[test]
    fn test_checksum_mismatch() {
        let mut bytes = encode_receive_packet(&control_packet()).unwrap().to_vec();
        let last = bytes.len() - 1;
        let good = bytes[last];
        bytes[last] ^= 0xFF;

        let mut decoder = FrameDecoder::default();
        let result = feed_all(&mut decoder, &bytes).pop().unwrap();
        assert_eq!(
            result,
            Feed::Error(LinkError::ChecksumMismatch {
                expected: good,
                actual: good ^ 0xFF,
            })
        );
        assert_eq!(decoder.state(), RxState::WaitingForStart);
    }

    #[test]
    fn test_length_overflow_is_immediate() {
        let mut decoder = FrameDecoder::new(100);
        assert_eq!(decoder.feed(START_DELIMITER), Feed::Incomplete);
        assert_eq!(decoder.feed(0x00), Feed::Incomplete);
        assert_eq!(
            decoder.feed(101),
            Feed::Error(LinkError::LengthOverflow {
                declared: 101,
                max: 100,
            })
        );
        assert_eq!(decoder.state(), RxState::WaitingForStart);
    }

    #[test]
    fn test_max_length_accepted() {
        let mut decoder = FrameDecoder::new(100);
        decoder.feed(START_DELIMITER);
        decoder.feed(0x00);
        assert_eq!(decoder.feed(100), Feed::Incomplete);
        assert_eq!(decoder.state(), RxState::ReceivingPayload);
    }

    #[test]
    fn test_zero_length_is_rejected() {
        let mut decoder = FrameDecoder::default();
        decoder.feed(START_DELIMITER);
        decoder.feed(0x00);
        assert_eq!(decoder.feed(0x00), Feed::Error(LinkError::EmptyFrame));
    }

    #[test]
    fn test_recovers_after_error() {
        let mut bad = encode_receive_packet(&control_packet()).unwrap().to_vec();
        let last = bad.len() - 1;
        bad[last] = bad[last].wrapping_add(1);
        let good = encode_receive_packet(&control_packet()).unwrap();

        let mut decoder = FrameDecoder::default();
        feed_all(&mut decoder, &bad);
        let result = feed_all(&mut decoder, &good).pop().unwrap();
        assert!(matches!(result, Feed::Frame(_)));
    }

    #[test]
    fn test_reset_discards_partial_frame() {
        let bytes = encode_receive_packet(&control_packet()).unwrap();
        let mut decoder = FrameDecoder::default();
        feed_all(&mut decoder, &bytes[..6]);
        assert_eq!(decoder.state(), RxState::ReceivingPayload);

        decoder.reset();
        assert_eq!(decoder.state(), RxState::WaitingForStart);
        let result = feed_all(&mut decoder, &bytes).pop().unwrap();
        assert!(matches!(result, Feed::Frame(_)));
    }

    #[test]
    fn test_decode_frame_one_shot() {
        let request = TransmitRequest {
            frame_id: 0x07,
            dest: Address(0x8621),
            options: OPTIONS_DEFAULT,
            payload: vec![0x04, 0x01, 0x01],
        };
        let bytes = encode_transmit_request(&request).unwrap();

        let frame = decode_frame(&bytes).unwrap();
        assert_eq!(TransmitRequest::parse(&frame).unwrap(), request);
    }

    #[test]
    fn test_decode_frame_invalid_start() {
        assert!(decode_frame(&[0xFF, 0x00, 0x01, 0x01, 0xFE]).is_err());
    }

    #[test]
    fn test_decode_frame_too_short() {
        assert!(decode_frame(&[]).is_err());
        assert!(decode_frame(&[START_DELIMITER, 0x00, 0x05, 0x01]).is_err());
    }

    proptest! {
        #[test]
        fn prop_round_trip(
            frame_id in any::<u8>(),
            dest in any::<u16>(),
            payload in proptest::collection::vec(any::<u8>(), 0..90),
        ) {
            let request = TransmitRequest {
                frame_id,
                dest: Address(dest),
                options: OPTIONS_DEFAULT,
                payload,
            };
            let bytes = encode_transmit_request(&request).unwrap();

            let mut decoder = FrameDecoder::default();
            let last = feed_all(&mut decoder, &bytes).pop().unwrap();
            match last {
                Feed::Frame(frame) => {
                    prop_assert_eq!(TransmitRequest::parse(&frame).unwrap(), request);
                }
                other => prop_assert!(false, "expected frame, got {:?}", other),
            }
        }

        #[test]
        fn prop_single_bit_flip_is_detected(
            payload in proptest::collection::vec(any::<u8>(), 1..60),
            bit in 0usize..8,
            pick in any::<proptest::sample::Index>(),
        ) {
            let packet = ReceivePacket {
                frame_id: 0,
                source: Address(0x8621),
                dest: Address(0x2086),
                options: 0,
                payload,
            };
            let mut bytes = encode_receive_packet(&packet).unwrap().to_vec();

            // Flip one bit in the checksummed region (type through payload end)
            let idx = 3 + pick.index(bytes.len() - 4);
            bytes[idx] ^= 1 << bit;

            let mut decoder = FrameDecoder::default();
            let last = feed_all(&mut decoder, &bytes).pop().unwrap();
            let is_checksum_error = matches!(last, Feed::Error(LinkError::ChecksumMismatch { .. }));
            prop_assert!(is_checksum_error, "flip at {} bit {} not detected", idx, bit);
        }
    }
}
