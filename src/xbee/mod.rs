//! # XBee API Frame Module
//!
//! Implementation of the XBee API frame format used on the radio link.
//!
//! This module handles:
//! - Transmit-request frame encoding (16-bit addressing)
//! - Incremental receive-frame decoding, one byte at a time
//! - 8-bit checksum calculation and verification
//! - Length bounding of partially received frames

pub mod protocol;
pub mod encoder;
pub mod decoder;
pub mod checksum;
