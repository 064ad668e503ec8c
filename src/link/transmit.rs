//! # Half-Duplex Transmitter
//!
//! Outbound frame FIFO with at most one frame handed to the link driver at a
//! time. The slot is released by the driver's transmit-complete notification.

use std::collections::VecDeque;

use bytes::Bytes;
use tracing::debug;

use crate::error::Result;
use crate::packet::Packet;
use crate::xbee::encoder::encode_transmit_request;
use crate::xbee::protocol::{Address, TransmitRequest, OPTIONS_DEFAULT};

/// Outbound frame queue
#[derive(Debug)]
pub struct Transmitter {
    pending: VecDeque<Bytes>,
    in_flight: bool,
    next_frame_id: u8,
    frames_sent: u64,
}

impl Default for Transmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Transmitter {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            in_flight: false,
            next_frame_id: 1,
            frames_sent: 0,
        }
    }

    /// Encode a packet as a transmit request to `dest` and queue it
    ///
    /// # Errors
    ///
    /// Returns error if the packet does not fit an API frame
    pub fn send_packet(&mut self, dest: Address, packet: &Packet) -> Result<()> {
        let request = TransmitRequest {
            frame_id: self.allocate_frame_id(),
            dest,
            options: OPTIONS_DEFAULT,
            payload: packet.encode(),
        };
        let frame = encode_transmit_request(&request)?;

        debug!(
            "Queued {:?} to {} (frame id {}, {} bytes)",
            packet.packet_type(),
            dest,
            request.frame_id,
            frame.len()
        );
        self.pending.push_back(frame);
        Ok(())
    }

    /// Hand the next frame to the link driver, if the line is free
    pub fn take_ready(&mut self) -> Option<Bytes> {
        if self.in_flight {
            return None;
        }
        let frame = self.pending.pop_front()?;
        self.in_flight = true;
        self.frames_sent += 1;
        Some(frame)
    }

    /// The link driver finished writing the frame in flight
    pub fn on_transmit_complete(&mut self) {
        self.in_flight = false;
    }

    /// True while a frame is being written
    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    /// Frames queued behind the one in flight
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Frames handed to the link driver so far
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    // Frame id 0 would suppress the radio's TX status reply
    fn allocate_frame_id(&mut self) -> u8 {
        let id = self.next_frame_id;
        self.next_frame_id = if id == u8::MAX { 1 } else { id + 1 };
        id
    }
}
