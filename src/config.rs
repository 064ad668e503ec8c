//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::error::{Result, ShipLinkError};
use crate::packet::TeamColor;
use crate::xbee::protocol::Address;

/// Baud rates the XBee UART can be configured for
pub const SUPPORTED_BAUD_RATES: [u32; 5] = [9600, 19200, 38400, 57600, 115200];

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub link: LinkConfig,
    #[serde(default)]
    pub pairing: PairingConfig,
    #[serde(default)]
    pub ship: ShipConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
}

/// Radio link configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LinkConfig {
    /// 16-bit address of this ship's radio
    #[serde(default = "default_local_address")]
    pub local_address: u16,

    #[serde(default = "default_inter_byte_timeout_ms")]
    pub inter_byte_timeout_ms: u64,

    /// Largest declared frame length accepted by the receiver
    #[serde(default = "default_max_frame_length")]
    pub max_frame_length: u16,

    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Timer resolution
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

/// Pairing handshake and keepalive timing
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct PairingConfig {
    #[serde(default = "default_pair_timeout_ms")]
    pub pair_timeout_ms: u64,

    #[serde(default = "default_pair_attempt_ms")]
    pub pair_attempt_ms: u64,
}

/// Ship identity and simulated sensors
#[derive(Debug, Deserialize, Clone)]
pub struct ShipConfig {
    #[serde(default = "default_home_color")]
    pub home_color: TeamColor,

    /// Initial reading of the simulated fuel sensor
    #[serde(default = "default_fuel_empty")]
    pub fuel_empty: bool,
}

/// Log output configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Write a daily log file here in addition to stdout
    #[serde(default)]
    pub directory: Option<String>,

    /// Filter in `RUST_LOG` syntax, a bare level such as `info` or directives
    /// such as `ship_link=debug,info`
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_serial_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud_rate() -> u32 { 9600 }

fn default_local_address() -> u16 { 0x2086 }
fn default_inter_byte_timeout_ms() -> u64 { 500 }
fn default_max_frame_length() -> u16 { 100 }
fn default_queue_capacity() -> usize { 64 }
fn default_tick_ms() -> u64 { 10 }

fn default_pair_timeout_ms() -> u64 { 1000 }
fn default_pair_attempt_ms() -> u64 { 200 }

fn default_home_color() -> TeamColor { TeamColor::Red }
fn default_fuel_empty() -> bool { false }

fn default_log_level() -> String { "info".to_string() }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            local_address: default_local_address(),
            inter_byte_timeout_ms: default_inter_byte_timeout_ms(),
            max_frame_length: default_max_frame_length(),
            queue_capacity: default_queue_capacity(),
            tick_ms: default_tick_ms(),
        }
    }
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            pair_timeout_ms: default_pair_timeout_ms(),
            pair_attempt_ms: default_pair_attempt_ms(),
        }
    }
}

impl Default for ShipConfig {
    fn default() -> Self {
        Self {
            home_color: default_home_color(),
            fuel_empty: default_fuel_empty(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: None,
            level: default_log_level(),
        }
    }
}

impl LinkConfig {
    pub fn local_address(&self) -> Address {
        Address(self.local_address)
    }

    pub fn inter_byte_timeout(&self) -> Duration {
        Duration::from_millis(self.inter_byte_timeout_ms)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

impl PairingConfig {
    /// Deadline for the first control packet and keepalive window after it
    pub fn pair_timeout(&self) -> Duration {
        Duration::from_millis(self.pair_timeout_ms)
    }

    /// PairAck retransmission period
    pub fn pair_attempt(&self) -> Duration {
        Duration::from_millis(self.pair_attempt_ms)
    }
}

fn invalid(msg: impl std::fmt::Display) -> ShipLinkError {
    ShipLinkError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ship_link::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns error if TOML parsing or validation fails
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.serial.port.is_empty() {
            return Err(invalid("serial port cannot be empty"));
        }

        if !SUPPORTED_BAUD_RATES.contains(&self.serial.baud_rate) {
            return Err(invalid(format!(
                "baud_rate must be one of: {:?}",
                SUPPORTED_BAUD_RATES
            )));
        }

        if self.link.inter_byte_timeout_ms == 0 || self.link.inter_byte_timeout_ms > 10000 {
            return Err(invalid("inter_byte_timeout_ms must be between 1 and 10000"));
        }

        // Shortest frame: type + frame id + source + dest + options + packet type
        if self.link.max_frame_length < 8 {
            return Err(invalid("max_frame_length must be at least 8"));
        }

        if self.link.queue_capacity == 0 {
            return Err(invalid("queue_capacity must be greater than 0"));
        }

        if self.link.tick_ms == 0 || self.link.tick_ms > 1000 {
            return Err(invalid("tick_ms must be between 1 and 1000"));
        }

        if self.pairing.pair_attempt_ms == 0 {
            return Err(invalid("pair_attempt_ms must be greater than 0"));
        }

        if self.pairing.pair_attempt_ms >= self.pairing.pair_timeout_ms {
            return Err(invalid("pair_attempt_ms must be less than pair_timeout_ms"));
        }

        if self.logging.directory.as_deref() == Some("") {
            return Err(invalid("logging directory cannot be empty when set"));
        }

        if self.logging.level.trim().is_empty() {
            return Err(invalid("log level cannot be empty"));
        }

        if let Err(e) = EnvFilter::try_new(&self.logging.level) {
            return Err(invalid(format!(
                "invalid log filter '{}': {}",
                self.logging.level, e
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_valid_config() -> Config {
        Config::default()
    }

    #[test]
    fn test_default_config() {
        let config = create_valid_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.link.local_address(), Address(0x2086));
        assert_eq!(config.pairing.pair_timeout(), Duration::from_millis(1000));
        assert_eq!(config.pairing.pair_attempt(), Duration::from_millis(200));
        assert_eq!(config.link.inter_byte_timeout(), Duration::from_millis(500));
        assert_eq!(config.link.max_frame_length, 100);
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[serial]
port = "/dev/ttyUSB1"
baud_rate = 57600

[link]
local_address = 0x2087

[pairing]
pair_timeout_ms = 2000

[ship]
home_color = "blue"
fuel_empty = true

[logging]
directory = "./logs"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.serial.port, "/dev/ttyUSB1");
        assert_eq!(config.serial.baud_rate, 57600);
        assert_eq!(config.link.local_address(), Address(0x2087));
        assert_eq!(config.link.tick_ms, 10);
        assert_eq!(config.pairing.pair_timeout_ms, 2000);
        assert_eq!(config.pairing.pair_attempt_ms, 200);
        assert_eq!(config.ship.home_color, TeamColor::Blue);
        assert!(config.ship.fuel_empty);
        assert_eq!(config.logging.directory.as_deref(), Some("./logs"));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.serial.port, "/dev/ttyUSB0");
        assert_eq!(config.ship.home_color, TeamColor::Red);
        assert!(config.logging.directory.is_none());
    }

    #[test]
    fn test_missing_file() {
        let result = Config::load("/nonexistent/ship-link.toml");
        assert!(matches!(result, Err(ShipLinkError::Io(_))));
    }

    #[test]
    fn test_invalid_color() {
        let result = Config::parse("[ship]\nhome_color = \"green\"\n");
        assert!(matches!(result, Err(ShipLinkError::Config(_))));
    }

    #[test]
    fn test_empty_serial_port() {
        let mut config = create_valid_config();
        config.serial.port = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unsupported_baud_rate() {
        let mut config = create_valid_config();
        config.serial.baud_rate = 420000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inter_byte_timeout_zero() {
        let mut config = create_valid_config();
        config.link.inter_byte_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inter_byte_timeout_too_high() {
        let mut config = create_valid_config();
        config.link.inter_byte_timeout_ms = 10001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_frame_length_too_small() {
        let mut config = create_valid_config();
        config.link.max_frame_length = 7;
        assert!(config.validate().is_err());
        config.link.max_frame_length = 8;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_queue_capacity_zero() {
        let mut config = create_valid_config();
        config.link.queue_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tick_out_of_range() {
        let mut config = create_valid_config();
        config.link.tick_ms = 0;
        assert!(config.validate().is_err());
        config.link.tick_ms = 1001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pair_attempt_not_below_timeout() {
        let mut config = create_valid_config();
        config.pairing.pair_attempt_ms = config.pairing.pair_timeout_ms;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pair_attempt_zero() {
        let mut config = create_valid_config();
        config.pairing.pair_attempt_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_directory() {
        let mut config = create_valid_config();
        config.logging.directory = Some(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = create_valid_config();
        config.logging.level = "ship_link=verbose".to_string();
        assert!(matches!(config.validate(), Err(ShipLinkError::Config(_))));

        config.logging.level = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_filter_directives_accepted() {
        let mut config = create_valid_config();
        for level in ["warn", "ship_link=debug,info", "ship_link::link=trace"] {
            config.logging.level = level.to_string();
            assert!(config.validate().is_ok(), "rejected {}", level);
        }
    }
}
