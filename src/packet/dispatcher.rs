//! # Packet Dispatcher
//!
//! Turns checksum-valid frames into typed protocol events.
//!
//! Frames addressed to another device are dropped without comment; on a
//! shared radio channel that is the normal case, not an error.

use tracing::{debug, trace};

use super::Packet;
use crate::framework::Event;
use crate::xbee::protocol::{Address, ReceivePacket, XbeeFrame, API_RX_PACKET_16};

/// Classifies received frames for one local device
#[derive(Debug, Clone)]
pub struct PacketDispatcher {
    local: Address,
}

impl PacketDispatcher {
    pub fn new(local: Address) -> Self {
        Self { local }
    }

    /// Address frames must be sent to
    pub fn local_address(&self) -> Address {
        self.local
    }

    /// Classify one frame
    ///
    /// Returns `None` for frames that are not receive packets, are addressed
    /// elsewhere, or do not carry a well-formed packet.
    pub fn classify(&self, frame: &XbeeFrame) -> Option<Event> {
        if frame.frame_type != API_RX_PACKET_16 {
            debug!("Ignoring API frame type 0x{:02X}", frame.frame_type);
            return None;
        }

        let rx = match ReceivePacket::parse(frame) {
            Ok(rx) => rx,
            Err(e) => {
                debug!("Dropping malformed receive frame: {}", e);
                return None;
            }
        };

        if rx.dest != self.local {
            trace!("Frame for {} from {} not for us", rx.dest, rx.source);
            return None;
        }

        let packet = match Packet::decode(&rx.payload) {
            Ok(packet) => packet,
            Err(e) => {
                debug!("Dropping packet from {}: {}", rx.source, e);
                return None;
            }
        };

        let source = rx.source;
        Some(match packet {
            Packet::PairRequest { color } => Event::PairRequest { source, color },
            Packet::PairAck => Event::PairAck { source },
            Packet::Control(fields) => Event::Control { source, fields },
            Packet::Status { telemetry } => Event::Status { source, telemetry },
        })
    }
}
