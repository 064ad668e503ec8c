//! # Ship Pairing State Machine
//!
//! Session layer of the ship: accepts a pairing request, retransmits the
//! acknowledgement until the controller starts sending control packets, and
//! tears the session down on silence or fuel events.
//!
//! | From | Event (guard) | To |
//! |------|---------------|----|
//! | Waiting2Pair | PairRequest (may pair) | Trying2Pair |
//! | Trying2Pair | PairAttempt timeout | Trying2Pair (resend ack) |
//! | Trying2Pair | PairTimeout timeout | Waiting2Pair |
//! | Trying2Pair | Control | Communicating |
//! | Communicating | Control | Communicating |
//! | Communicating | PairTimeout timeout | Waiting2Pair |
//! | Communicating | OutOfFuel | Waiting2Pair |
//! | Communicating | Refueled (partner not home color) | Waiting2Pair |
//!
//! Every other (state, event) pair is ignored.

use tracing::{debug, error, info};

use super::hardware::ShipHardware;
use crate::config::PairingConfig;
use crate::framework::{Context, Event, EventPoster, Service};
use crate::packet::{ControlFields, Packet, TeamColor};
use crate::timer::TimerId;
use crate::xbee::protocol::Address;

/// Session state of the ship
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShipState {
    /// Idle, no session
    Waiting2Pair,
    /// PairAck sent, waiting for the first control packet
    Trying2Pair,
    /// Paired and receiving control packets
    Communicating,
}

/// The current pairing partner
///
/// The handshake and keepalive deadlines are the `PairTimeout` and
/// `PairAttempt` timers, armed only while a session exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairingSession {
    pub partner: Address,
    pub partner_color: TeamColor,
}

/// Pairing/control state machine of the ship
#[derive(Debug)]
pub struct ShipMaster<H> {
    state: ShipState,
    session: Option<PairingSession>,
    last_paired: Option<Address>,
    home_color: TeamColor,
    timing: PairingConfig,
    hardware: H,
    priority: u8,
}

impl<H: ShipHardware> ShipMaster<H> {
    /// Create the state machine in `Waiting2Pair`
    ///
    /// The home team color is read from the hardware once, here.
    pub fn new(hardware: H, timing: PairingConfig) -> Self {
        let home_color = hardware.own_color();
        Self {
            state: ShipState::Waiting2Pair,
            session: None,
            last_paired: None,
            home_color,
            timing,
            hardware,
            priority: 0,
        }
    }

    pub fn session(&self) -> Option<&PairingSession> {
        self.session.as_ref()
    }

    /// Most recent partner that was dropped for running out of fuel
    pub fn last_paired(&self) -> Option<Address> {
        self.last_paired
    }

    pub fn home_color(&self) -> TeamColor {
        self.home_color
    }

    pub fn priority(&self) -> u8 {
        self.priority
    }

    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hardware
    }

    // Empty tank: only the home team may take control.
    // Fueled: anyone except the partner that just drained it.
    fn may_pair(&self, source: Address, color: TeamColor) -> bool {
        if self.hardware.fuel_empty() {
            color == self.home_color
        } else {
            self.last_paired != Some(source)
        }
    }

    fn partner_color(&self) -> Option<TeamColor> {
        self.session.map(|s| s.partner_color)
    }

    fn transition(&mut self, next: ShipState) {
        if self.state != next {
            info!("{:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    fn send(&self, packet: Packet, ctx: &mut Context<'_>) {
        let Some(session) = self.session else {
            return;
        };
        if let Err(e) = ctx.transmitter.send_packet(session.partner, &packet) {
            error!("Failed to queue {:?}: {}", packet.packet_type(), e);
        }
    }

    fn begin_pairing(&mut self, source: Address, color: TeamColor, ctx: &mut Context<'_>) {
        self.session = Some(PairingSession {
            partner: source,
            partner_color: color,
        });
        ctx.timers.arm(TimerId::PairTimeout, self.timing.pair_timeout());
        ctx.timers.arm(TimerId::PairAttempt, self.timing.pair_attempt());
        self.send(Packet::PairAck, ctx);
        info!("Pair request from {} ({:?}) accepted", source, color);
        self.transition(ShipState::Trying2Pair);
    }

    fn on_control(&mut self, fields: &ControlFields, ctx: &mut Context<'_>) {
        let telemetry = self.hardware.status_telemetry();
        self.send(Packet::Status { telemetry }, ctx);
        ctx.timers.arm(TimerId::PairTimeout, self.timing.pair_timeout());
        ctx.timers.disarm(TimerId::PairAttempt);
        self.hardware.apply_control(fields);
        self.transition(ShipState::Communicating);
    }

    fn end_session(&mut self, reason: &str, ctx: &mut Context<'_>) {
        if let Some(session) = self.session.take() {
            info!("Session with {} ended: {}", session.partner, reason);
        }
        ctx.timers.disarm(TimerId::PairTimeout);
        ctx.timers.disarm(TimerId::PairAttempt);
        self.transition(ShipState::Waiting2Pair);
    }
}

impl<H: ShipHardware> Service for ShipMaster<H> {
    type State = ShipState;

    fn init(&mut self, priority: u8, poster: &EventPoster) -> bool {
        self.priority = priority;
        poster.post(Event::Init(priority))
    }

    fn run(&mut self, event: &Event, ctx: &mut Context<'_>) -> Event {
        use ShipState::*;

        match (self.state, event) {
            (_, Event::Init(_)) => {
                self.session = None;
                ctx.timers.disarm(TimerId::PairTimeout);
                ctx.timers.disarm(TimerId::PairAttempt);
                self.state = Waiting2Pair;
                info!("Ship ready in {:?} (home team {:?})", self.state, self.home_color);
            }

            (Waiting2Pair, Event::PairRequest { source, color }) => {
                if self.may_pair(*source, *color) {
                    self.begin_pairing(*source, *color, ctx);
                } else {
                    debug!("Pair request from {} ({:?}) refused", source, color);
                }
            }

            (Trying2Pair, Event::Timeout(TimerId::PairAttempt)) => {
                ctx.timers.arm(TimerId::PairAttempt, self.timing.pair_attempt());
                self.send(Packet::PairAck, ctx);
                debug!("PairAck resent");
            }
            (Trying2Pair, Event::Timeout(TimerId::PairTimeout)) => {
                self.end_session("no control packet before pairing deadline", ctx);
            }

            (Trying2Pair | Communicating, Event::Control { fields, .. }) => {
                self.on_control(fields, ctx);
            }

            (Communicating, Event::Timeout(TimerId::PairTimeout)) => {
                self.hardware.stop_actuators();
                self.end_session("keepalive timeout", ctx);
            }
            (Communicating, Event::OutOfFuel) => {
                self.hardware.stop_actuators();
                self.last_paired = self.session.map(|s| s.partner);
                self.end_session("out of fuel", ctx);
            }
            (Communicating, Event::Refueled) => {
                if self.partner_color() != Some(self.home_color) {
                    self.hardware.stop_actuators();
                    self.end_session("refueled, opposing team released", ctx);
                }
            }

            _ => {}
        }

        Event::NoEvent
    }

    fn query(&self) -> ShipState {
        self.state
    }
}
