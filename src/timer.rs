//! # Timer Service
//!
//! Named one-shot countdowns driven by a periodic tick.
//!
//! Arming a timer that is already running restarts it at its full duration;
//! nothing accumulates. Each expiry is reported exactly once, after which the
//! timer is idle until armed again.

use std::collections::BTreeMap;
use std::time::Duration;

/// Identity of a one-shot timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerId {
    /// Handshake deadline / session keepalive
    PairTimeout,
    /// PairAck retransmission
    PairAttempt,
    /// Receive inter-byte window
    RxInterByte,
}

#[derive(Debug, Clone, Copy)]
struct Countdown {
    duration: Duration,
    remaining: Duration,
}

/// Collection of armed one-shot timers
#[derive(Debug, Default)]
pub struct TimerService {
    armed: BTreeMap<TimerId, Countdown>,
}

impl TimerService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) a timer at its full duration
    pub fn arm(&mut self, id: TimerId, duration: Duration) {
        self.armed.insert(
            id,
            Countdown {
                duration,
                remaining: duration,
            },
        );
    }

    /// Cancel a timer; no-op if it is not running
    pub fn disarm(&mut self, id: TimerId) {
        self.armed.remove(&id);
    }

    pub fn is_armed(&self, id: TimerId) -> bool {
        self.armed.contains_key(&id)
    }

    /// Time left on a running timer
    pub fn remaining(&self, id: TimerId) -> Option<Duration> {
        self.armed.get(&id).map(|c| c.remaining)
    }

    /// Duration a running timer was armed with
    pub fn duration(&self, id: TimerId) -> Option<Duration> {
        self.armed.get(&id).map(|c| c.duration)
    }

    /// Advance every running timer by `elapsed`
    ///
    /// Returns the timers that expired during this tick, in `TimerId` order.
    pub fn tick(&mut self, elapsed: Duration) -> Vec<TimerId> {
        let mut expired = Vec::new();
        for (id, countdown) in self.armed.iter_mut() {
            countdown.remaining = countdown.remaining.saturating_sub(elapsed);
            if countdown.remaining.is_zero() {
                expired.push(*id);
            }
        }
        for id in &expired {
            self.armed.remove(id);
        }
        expired
    }
}
