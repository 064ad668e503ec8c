//! # Ship Session Module
//!
//! Session layer of the ship.
//!
//! This module handles:
//! - Pairing with an ansible and acknowledging until control starts
//! - Forwarding control packets to the actuators and answering with status
//! - Ending the session on keepalive timeout or fuel events

pub mod hardware;
pub mod master;

pub use hardware::{ShipHardware, SimulatedHardware};
pub use master::{PairingSession, ShipMaster, ShipState};
