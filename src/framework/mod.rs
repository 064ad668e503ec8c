//! # Cooperative Event Framework
//!
//! Run-to-completion event dispatch shared by the link and ship services.
//!
//! The serial reader task is the only asynchronous producer; it posts bytes
//! into the bounded [`queue`]. Events raised on the consumer side (timer
//! expiries, fuel edges, classified packets) go to a local deferred FIFO that
//! can never overflow. A single consumer, the [`scheduler::Scheduler`], runs
//! exactly one state-machine step per event, deferred events first.

use std::collections::VecDeque;
use std::fmt;

use crate::link::transmit::Transmitter;
use crate::packet::{ControlFields, TeamColor};
use crate::timer::{TimerId, TimerService};
use crate::xbee::protocol::Address;

pub mod queue;
pub mod scheduler;

pub use queue::{EventPoster, EventQueue};

/// Events exchanged between producers and services
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Initial transition for the service with this priority
    Init(u8),
    /// Placeholder result of a successful `run`
    NoEvent,
    /// One byte arrived from the radio
    ByteReceived(u8),
    /// The link driver finished writing the frame in flight
    TransmitComplete,
    /// A one-shot timer expired
    Timeout(TimerId),
    PairRequest { source: Address, color: TeamColor },
    PairAck { source: Address },
    Control { source: Address, fields: ControlFields },
    Status { source: Address, telemetry: Vec<u8> },
    /// Fuel sensor went from fueled to empty
    OutOfFuel,
    /// Fuel sensor went from empty to fueled
    Refueled,
}

/// Shared resources a service may touch while handling one event
pub struct Context<'a> {
    pub timers: &'a mut TimerService,
    pub transmitter: &'a mut Transmitter,
    pub deferred: &'a mut VecDeque<Event>,
}

impl Context<'_> {
    /// Raise an event for a later step of the consumer loop
    pub fn post(&mut self, event: Event) {
        self.deferred.push_back(event);
    }
}

/// Service contract of the cooperative dispatcher
pub trait Service {
    /// Externally visible state
    type State: Copy + fmt::Debug + PartialEq;

    /// Save the priority and post the initial transition event
    ///
    /// Returns `false` if the initial event could not be queued.
    fn init(&mut self, priority: u8, poster: &EventPoster) -> bool;

    /// Handle one event to completion
    ///
    /// Returns [`Event::NoEvent`] when the event was handled (or ignored).
    fn run(&mut self, event: &Event, ctx: &mut Context<'_>) -> Event;

    /// Current state
    fn query(&self) -> Self::State;
}
