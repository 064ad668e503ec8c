//! # Ship Link Library
//!
//! Radio link and pairing session of a remotely driven ship.
//!
//! This library provides the XBee API frame codec, the byte-driven receive
//! state machine with its packet dispatcher, and the ship-side pairing state
//! machine, all running on a cooperative run-to-completion event framework.

pub mod config;
pub mod error;
pub mod framework;
pub mod link;
pub mod packet;
pub mod serial;
pub mod ship;
pub mod timer;
pub mod xbee;
