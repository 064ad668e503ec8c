//! # Ship Hardware Collaborators
//!
//! Actuator and sensor seam consumed by the pairing state machine. The real
//! drivers (motor PWM, fuel sensor, team-select switch) live outside this
//! crate; [`SimulatedHardware`] stands in for them on a host.

use tracing::info;

use crate::packet::{ControlFields, TeamColor};

/// Fuel telemetry byte: tank empty
pub const FUEL_EMPTY: u8 = 0x00;

/// Fuel telemetry byte: tank has fuel
pub const FUEL_OK: u8 = 0x01;

/// Actuators and sensors of the ship
#[cfg_attr(test, mockall::automock)]
pub trait ShipHardware {
    /// Bring every actuator to rest
    fn stop_actuators(&mut self);

    /// Drive actuators from a control packet
    fn apply_control(&mut self, fields: &ControlFields);

    /// Fuel sensor reading
    fn fuel_empty(&self) -> bool;

    /// Team-select switch
    fn own_color(&self) -> TeamColor;

    /// Telemetry bytes carried by a status packet
    fn status_telemetry(&self) -> Vec<u8>;
}

/// Host-side stand-in that records and logs actuator commands
#[derive(Debug, Clone)]
pub struct SimulatedHardware {
    color: TeamColor,
    fuel_empty: bool,
    last_control: Option<ControlFields>,
    stop_count: u32,
}

impl SimulatedHardware {
    pub fn new(color: TeamColor, fuel_empty: bool) -> Self {
        Self {
            color,
            fuel_empty,
            last_control: None,
            stop_count: 0,
        }
    }

    /// Change the simulated fuel sensor
    pub fn set_fuel_empty(&mut self, empty: bool) {
        self.fuel_empty = empty;
    }

    /// Fields of the most recent control command still in effect
    pub fn last_control(&self) -> Option<ControlFields> {
        self.last_control
    }

    /// Number of times the actuators were stopped
    pub fn stop_count(&self) -> u32 {
        self.stop_count
    }
}

impl ShipHardware for SimulatedHardware {
    fn stop_actuators(&mut self) {
        info!("Actuators stopped");
        self.last_control = None;
        self.stop_count += 1;
    }

    fn apply_control(&mut self, fields: &ControlFields) {
        info!(
            "Control: FB={} LR={} turret R={} P={} CTRL=0x{:02X}",
            fields.fb, fields.lr, fields.turret_r, fields.turret_p, fields.ctrl
        );
        self.last_control = Some(*fields);
    }

    fn fuel_empty(&self) -> bool {
        self.fuel_empty
    }

    fn own_color(&self) -> TeamColor {
        self.color
    }

    fn status_telemetry(&self) -> Vec<u8> {
        let fuel = if self.fuel_empty { FUEL_EMPTY } else { FUEL_OK };
        vec![fuel, self.color.to_byte()]
    }
}
