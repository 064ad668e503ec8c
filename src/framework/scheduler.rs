//! # Event Scheduler
//!
//! Single consumer of the event queue. Owns both services and the shared
//! resources they touch, and routes each event to exactly one of them:
//!
//! | Event | Handled by |
//! |-------|------------|
//! | `Init(p)` | service with priority `p` |
//! | `ByteReceived`, `Timeout(RxInterByte)` | [`AnsibleLink`] |
//! | `TransmitComplete` | [`Transmitter`] |
//! | everything else | [`ShipMaster`] |
//!
//! Only the serial reader feeds the bounded queue. Timer expiries, fuel edges
//! and packets classified by the link are raised on the consumer side and
//! kept in an unbounded deferred FIFO, so a queue full of radio bytes can
//! never cost the session a timeout.

use std::collections::VecDeque;
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, info, trace};

use super::queue::{bounded, EventPoster, EventQueue};
use super::{Context, Event, Service};
use crate::config::Config;
use crate::link::receive::{AnsibleLink, LinkStats};
use crate::link::transmit::Transmitter;
use crate::packet::dispatcher::PacketDispatcher;
use crate::ship::hardware::ShipHardware;
use crate::ship::master::{ShipMaster, ShipState};
use crate::timer::{TimerId, TimerService};
use crate::xbee::decoder::RxState;

/// Priority of the link receiver
pub const LINK_PRIORITY: u8 = 0;

/// Priority of the ship session
pub const SHIP_PRIORITY: u8 = 1;

/// Cooperative run-to-completion dispatcher
pub struct Scheduler<H> {
    link: AnsibleLink,
    ship: ShipMaster<H>,
    timers: TimerService,
    transmitter: Transmitter,
    poster: EventPoster,
    queue: EventQueue,
    deferred: VecDeque<Event>,
    fuel_empty: bool,
}

impl<H: ShipHardware> Scheduler<H> {
    /// Build both services from configuration
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `hardware` - Actuators and sensors of the ship
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ship_link::config::Config;
    /// use ship_link::framework::scheduler::Scheduler;
    /// use ship_link::ship::SimulatedHardware;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// let hardware = SimulatedHardware::new(config.ship.home_color, config.ship.fuel_empty);
    /// let mut scheduler = Scheduler::new(&config, hardware);
    /// scheduler.init();
    /// scheduler.run_until_idle();
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(config: &Config, hardware: H) -> Self {
        let (poster, queue) = bounded(config.link.queue_capacity);
        let fuel_empty = hardware.fuel_empty();
        let dispatcher = PacketDispatcher::new(config.link.local_address());

        Self {
            link: AnsibleLink::new(
                dispatcher,
                config.link.max_frame_length,
                config.link.inter_byte_timeout(),
            ),
            ship: ShipMaster::new(hardware, config.pairing),
            timers: TimerService::new(),
            transmitter: Transmitter::new(),
            poster,
            queue,
            deferred: VecDeque::new(),
            fuel_empty,
        }
    }

    /// Producer handle for tasks feeding the queue
    pub fn poster(&self) -> EventPoster {
        self.poster.clone()
    }

    /// Post the initial event of every service
    ///
    /// Returns `false` if any initial event could not be queued.
    pub fn init(&mut self) -> bool {
        let link = self.link.init(LINK_PRIORITY, &self.poster);
        let ship = self.ship.init(SHIP_PRIORITY, &self.poster);
        link && ship
    }

    /// Run one event to completion
    pub fn dispatch(&mut self, event: Event) {
        if let Event::Timeout(id) = event {
            // Re-armed between expiry and delivery
            if self.timers.is_armed(id) {
                debug!("Dropping stale {:?} timeout", id);
                return;
            }
        }

        trace!("Dispatching {:?}", event);

        let mut ctx = Context {
            timers: &mut self.timers,
            transmitter: &mut self.transmitter,
            deferred: &mut self.deferred,
        };

        match event {
            Event::NoEvent => {}
            Event::TransmitComplete => ctx.transmitter.on_transmit_complete(),
            Event::Init(LINK_PRIORITY) => {
                self.link.run(&event, &mut ctx);
            }
            Event::Init(SHIP_PRIORITY) => {
                self.ship.run(&event, &mut ctx);
            }
            Event::Init(priority) => debug!("No service with priority {}", priority),
            Event::ByteReceived(_) | Event::Timeout(TimerId::RxInterByte) => {
                self.link.run(&event, &mut ctx);
            }
            _ => {
                self.ship.run(&event, &mut ctx);
            }
        }
    }

    /// Dispatch deferred and queued events until both are empty
    ///
    /// Deferred events run first. Returns the number of events dispatched.
    pub fn run_until_idle(&mut self) -> usize {
        let mut count = 0;
        loop {
            count += self.run_deferred();
            match self.queue.try_next() {
                Some(event) => {
                    self.dispatch(event);
                    count += 1;
                }
                None => return count,
            }
        }
    }

    /// Dispatch the events raised on the consumer side
    ///
    /// Returns the number of events dispatched.
    pub fn run_deferred(&mut self) -> usize {
        let mut count = 0;
        while let Some(event) = self.deferred.pop_front() {
            self.dispatch(event);
            count += 1;
        }
        count
    }

    /// Wait for the next queued event
    pub async fn next_event(&mut self) -> Option<Event> {
        self.queue.next().await
    }

    /// Advance timers and sample the fuel sensor
    ///
    /// Expired timers and fuel edges are deferred as events, not handled here.
    pub fn tick(&mut self, elapsed: Duration) {
        for id in self.timers.tick(elapsed) {
            self.deferred.push_back(Event::Timeout(id));
        }

        let fuel_empty = self.ship.hardware().fuel_empty();
        if fuel_empty != self.fuel_empty {
            self.fuel_empty = fuel_empty;
            let event = if fuel_empty {
                Event::OutOfFuel
            } else {
                Event::Refueled
            };
            info!("Fuel sensor: {:?}", event);
            self.deferred.push_back(event);
        }
    }

    /// Next outbound frame for the link driver, if the line is free
    ///
    /// The driver must call [`Scheduler::transmit_complete`] once it is written.
    pub fn take_ready_frame(&mut self) -> Option<Bytes> {
        self.transmitter.take_ready()
    }

    /// The link driver finished writing the frame in flight
    pub fn transmit_complete(&mut self) {
        self.dispatch(Event::TransmitComplete);
    }

    /// Bring the actuators to rest before exit
    pub fn shutdown(&mut self) {
        self.ship.hardware_mut().stop_actuators();
        info!(
            "Shut down in {:?} ({} frames sent)",
            self.ship.query(),
            self.transmitter.frames_sent()
        );
    }

    pub fn ship_state(&self) -> ShipState {
        self.ship.query()
    }

    pub fn link_state(&self) -> RxState {
        self.link.query()
    }

    pub fn link_stats(&self) -> LinkStats {
        self.link.stats()
    }

    pub fn ship(&self) -> &ShipMaster<H> {
        &self.ship
    }

    pub fn hardware(&self) -> &H {
        self.ship.hardware()
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        self.ship.hardware_mut()
    }
}
