//! # Application Packets
//!
//! Ship/ansible packets carried in the RF payload of XBee frames.
//! The first payload byte selects the packet type:
//!
//! | Byte | Packet | Body |
//! |------|--------|------|
//! | 0x01 | PairRequest | color |
//! | 0x02 | PairAck | - |
//! | 0x03 | Control | FB, LR, TurretR, TurretP, CTRL |
//! | 0x04 | Status | telemetry bytes |

use serde::Deserialize;

use crate::error::{Result, ShipLinkError};

pub mod dispatcher;

/// Pair request packet type
pub const PACKET_PAIR_REQUEST: u8 = 0x01;

/// Pair acknowledge packet type
pub const PACKET_PAIR_ACK: u8 = 0x02;

/// Control packet type
pub const PACKET_CONTROL: u8 = 0x03;

/// Status packet type
pub const PACKET_STATUS: u8 = 0x04;

/// Control body size (FB, LR, TurretR, TurretP, CTRL)
pub const CONTROL_FIELDS_SIZE: usize = 5;

/// Packet type selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    PairRequest,
    PairAck,
    Control,
    Status,
}

impl PacketType {
    /// Parse a packet type from its wire byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            PACKET_PAIR_REQUEST => Some(PacketType::PairRequest),
            PACKET_PAIR_ACK => Some(PacketType::PairAck),
            PACKET_CONTROL => Some(PacketType::Control),
            PACKET_STATUS => Some(PacketType::Status),
            _ => None,
        }
    }

    /// Wire byte
    pub fn to_byte(self) -> u8 {
        match self {
            PacketType::PairRequest => PACKET_PAIR_REQUEST,
            PacketType::PairAck => PACKET_PAIR_ACK,
            PacketType::Control => PACKET_CONTROL,
            PacketType::Status => PACKET_STATUS,
        }
    }
}

/// Team affiliation of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamColor {
    Blue,
    Red,
}

impl TeamColor {
    /// Parse from the wire byte (0x00 blue, 0x01 red)
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(TeamColor::Blue),
            0x01 => Some(TeamColor::Red),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            TeamColor::Blue => 0x00,
            TeamColor::Red => 0x01,
        }
    }
}

/// Command bytes of a control packet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlFields {
    /// Forward/back drive
    pub fb: u8,
    /// Left/right drive
    pub lr: u8,
    /// Turret rotation
    pub turret_r: u8,
    /// Turret pitch
    pub turret_p: u8,
    /// Auxiliary control bits
    pub ctrl: u8,
}

/// Decoded application packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    PairRequest { color: TeamColor },
    PairAck,
    Control(ControlFields),
    Status { telemetry: Vec<u8> },
}

impl Packet {
    /// Type of this packet
    pub fn packet_type(&self) -> PacketType {
        match self {
            Packet::PairRequest { .. } => PacketType::PairRequest,
            Packet::PairAck => PacketType::PairAck,
            Packet::Control(_) => PacketType::Control,
            Packet::Status { .. } => PacketType::Status,
        }
    }

    /// Decode an RF payload
    ///
    /// # Errors
    ///
    /// Returns error if the payload is empty, the type byte is unknown, or the
    /// body is shorter than the type requires
    pub fn decode(payload: &[u8]) -> Result<Self> {
        let (&type_byte, body) = payload
            .split_first()
            .ok_or_else(|| ShipLinkError::Protocol("Empty packet".to_string()))?;

        let packet_type = PacketType::from_byte(type_byte).ok_or_else(|| {
            ShipLinkError::Protocol(format!("Unknown packet type: 0x{:02X}", type_byte))
        })?;

        match packet_type {
            PacketType::PairRequest => {
                let &color_byte = body.first().ok_or_else(|| {
                    ShipLinkError::Protocol("Pair request missing color".to_string())
                })?;
                let color = TeamColor::from_byte(color_byte).ok_or_else(|| {
                    ShipLinkError::Protocol(format!("Invalid team color: 0x{:02X}", color_byte))
                })?;
                Ok(Packet::PairRequest { color })
            }
            PacketType::PairAck => Ok(Packet::PairAck),
            PacketType::Control => {
                if body.len() < CONTROL_FIELDS_SIZE {
                    return Err(ShipLinkError::Protocol(format!(
                        "Control packet too short: {} bytes",
                        body.len()
                    )));
                }
                Ok(Packet::Control(ControlFields {
                    fb: body[0],
                    lr: body[1],
                    turret_r: body[2],
                    turret_p: body[3],
                    ctrl: body[4],
                }))
            }
            PacketType::Status => Ok(Packet::Status {
                telemetry: body.to_vec(),
            }),
        }
    }

    /// Encode into an RF payload
    pub fn encode(&self) -> Vec<u8> {
        let mut out = vec![self.packet_type().to_byte()];
        match self {
            Packet::PairRequest { color } => out.push(color.to_byte()),
            Packet::PairAck => {}
            Packet::Control(f) => {
                out.extend_from_slice(&[f.fb, f.lr, f.turret_r, f.turret_p, f.ctrl])
            }
            Packet::Status { telemetry } => out.extend_from_slice(telemetry),
        }
        out
    }
}
