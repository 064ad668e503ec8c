//! # Error Types
//!
//! Custom error types for Ship Link using `thiserror`.

use thiserror::Error;

/// Main error type for Ship Link
#[derive(Debug, Error)]
pub enum ShipLinkError {
    /// XBee API protocol errors
    #[error("XBee protocol error: {0}")]
    Protocol(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// None of the candidate serial devices could be opened
    #[error("No XBee serial device found (tried: {0})")]
    SerialPortNotFound(String),
}

/// Receive-side link errors.
///
/// Every variant is recovered inside the link layer by discarding the
/// partial frame; none of them is ever surfaced to the session layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LinkError {
    /// Gap between two bytes of one frame exceeded the receive window
    #[error("inter-byte timeout")]
    InterByteTimeout,

    /// Frame checksum did not verify
    #[error("checksum mismatch: expected 0x{expected:02X}, got 0x{actual:02X}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    /// Declared length is larger than the receive buffer
    #[error("declared length {declared} exceeds maximum {max}")]
    LengthOverflow { declared: u16, max: u16 },

    /// Declared length of zero (no frame type byte)
    #[error("empty frame")]
    EmptyFrame,
}

/// Result type alias for Ship Link
pub type Result<T> = std::result::Result<T, ShipLinkError>;
