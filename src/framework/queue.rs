//! Bounded event FIFO between asynchronous producers and the consumer loop.
//!
//! Backed by `tokio::sync::mpsc`, so posting from the serial reader task and
//! draining on the consumer never interleave. [`EventPoster::post`] never
//! blocks and reports `false` when the queue is full, while
//! [`EventPoster::post_wait`] parks the producer task until space frees up.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tracing::warn;

use super::Event;

/// Producer handle
#[derive(Debug, Clone)]
pub struct EventPoster {
    tx: mpsc::Sender<Event>,
}

/// Consumer end
#[derive(Debug)]
pub struct EventQueue {
    rx: mpsc::Receiver<Event>,
}

/// Create a bounded queue holding at most `capacity` events
///
/// A capacity of zero is raised to one.
pub fn bounded(capacity: usize) -> (EventPoster, EventQueue) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (EventPoster { tx }, EventQueue { rx })
}

impl EventPoster {
    /// Enqueue an event without blocking
    pub fn post(&self, event: Event) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                warn!("Event queue full, dropping {:?}", event);
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// Enqueue an event, waiting for space while the queue is full
    ///
    /// Returns `false` only once the consumer end is gone.
    pub async fn post_wait(&self, event: Event) -> bool {
        self.tx.send(event).await.is_ok()
    }
}

impl EventQueue {
    /// Take the next queued event, if any
    pub fn try_next(&mut self) -> Option<Event> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Wait for the next event
    ///
    /// Returns `None` once every producer handle is dropped and the queue is empty.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}
