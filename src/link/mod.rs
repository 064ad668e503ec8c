//! # Radio Link Module
//!
//! Byte-level plumbing between the XBee serial driver and the ship session.
//!
//! This module handles:
//! - Reassembling received bytes into frames with an inter-byte timeout
//! - Forwarding valid frames to the packet dispatcher
//! - Serialising outbound frames over the half-duplex link

pub mod receive;
pub mod transmit;

pub use receive::{AnsibleLink, LinkStats};
pub use transmit::Transmitter;
