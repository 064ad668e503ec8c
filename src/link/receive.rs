//! # Ansible Link Receive State Machine
//!
//! Byte-driven receiver sitting between the radio driver and the packet
//! dispatcher.
//!
//! ```text
//! WaitingForStart -> WaitingForLengthHigh -> WaitingForLengthLow
//!        ^                                          |
//!        |                                          v
//!        +------- ReceivingChecksum <------ ReceivingPayload
//! ```
//!
//! Any state other than `WaitingForStart` falls back to it when the gap
//! between two bytes exceeds the receive window. Link errors are counted and
//! logged here and never leave this module.

use std::time::Duration;

use tracing::debug;

use crate::error::LinkError;
use crate::framework::{Context, Event, EventPoster, Service};
use crate::packet::dispatcher::PacketDispatcher;
use crate::timer::TimerId;
use crate::xbee::decoder::{Feed, FrameDecoder, RxState};

/// Default inter-byte window
pub const DEFAULT_INTER_BYTE_TIMEOUT: Duration = Duration::from_millis(500);

/// Receive counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    /// Checksum-valid frames
    pub frames: u64,
    /// Frames turned into events
    pub dispatched: u64,
    pub checksum_errors: u64,
    pub length_errors: u64,
    pub timeouts: u64,
}

/// Receive side of the radio link
#[derive(Debug)]
pub struct AnsibleLink {
    decoder: FrameDecoder,
    dispatcher: PacketDispatcher,
    window: Duration,
    priority: u8,
    stats: LinkStats,
}

impl AnsibleLink {
    pub fn new(dispatcher: PacketDispatcher, max_length: u16, window: Duration) -> Self {
        Self {
            decoder: FrameDecoder::new(max_length),
            dispatcher,
            window,
            priority: 0,
            stats: LinkStats::default(),
        }
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    fn on_byte(&mut self, byte: u8, ctx: &mut Context<'_>) {
        match self.decoder.feed(byte) {
            Feed::Incomplete => {
                if self.decoder.state() != RxState::WaitingForStart {
                    ctx.timers.arm(TimerId::RxInterByte, self.window);
                }
            }
            Feed::Frame(frame) => {
                ctx.timers.disarm(TimerId::RxInterByte);
                self.stats.frames += 1;

                if let Some(event) = self.dispatcher.classify(&frame) {
                    debug!("Received {:?}", event);
                    ctx.post(event);
                    self.stats.dispatched += 1;
                }
            }
            Feed::Error(e) => {
                ctx.timers.disarm(TimerId::RxInterByte);
                self.discard(e);
            }
        }
    }

    fn discard(&mut self, error: LinkError) {
        match error {
            LinkError::ChecksumMismatch { .. } => self.stats.checksum_errors += 1,
            LinkError::LengthOverflow { .. } | LinkError::EmptyFrame => {
                self.stats.length_errors += 1
            }
            LinkError::InterByteTimeout => self.stats.timeouts += 1,
        }
        debug!("Discarding partial frame: {}", error);
    }
}

impl Service for AnsibleLink {
    type State = RxState;

    fn init(&mut self, priority: u8, poster: &EventPoster) -> bool {
        self.priority = priority;
        poster.post(Event::Init(priority))
    }

    fn run(&mut self, event: &Event, ctx: &mut Context<'_>) -> Event {
        match event {
            Event::Init(_) => {
                self.decoder.reset();
                ctx.timers.disarm(TimerId::RxInterByte);
                debug!(
                    "Link receiver ready (max length {}, window {:?})",
                    self.decoder.max_length(),
                    self.window
                );
            }
            Event::ByteReceived(byte) => self.on_byte(*byte, ctx),
            Event::Timeout(TimerId::RxInterByte) => {
                if self.decoder.state() != RxState::WaitingForStart {
                    self.decoder.reset();
                    self.discard(LinkError::InterByteTimeout);
                }
            }
            _ => {}
        }
        Event::NoEvent
    }

    fn query(&self) -> RxState {
        self.decoder.state()
    }
}
