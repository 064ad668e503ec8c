//! # Serial Communication Module
//!
//! Handles the UART connection to the XBee radio.
//!
//! This module handles:
//! - Opening the XBee serial port (8N1, no flow control)
//! - Feeding received bytes into the event queue, one event per byte
//! - Writing encoded API frames to the radio

pub mod port_trait;

use tokio::io::{AsyncRead, AsyncReadExt, ReadHalf, WriteHalf};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{debug, info, warn};

use crate::config::SerialConfig;
use crate::error::{Result, ShipLinkError};
use crate::framework::{Event, EventPoster};
pub use port_trait::{SerialPortIO, TokioSerialPort};

/// Fallback device paths tried after the configured one
pub const DEFAULT_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyUSB0", // USB XBee adapters
    "/dev/ttyAMA0", // On-board UART
];

/// Read chunk size of the receive pump
const READ_CHUNK: usize = 64;

/// XBee serial port handler
pub struct XbeeSerial {
    port: SerialStream,
    device_path: String,
}

impl std::fmt::Debug for XbeeSerial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XbeeSerial")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl XbeeSerial {
    /// Open the configured port, falling back to the default device paths
    ///
    /// # Errors
    ///
    /// Returns error if no candidate device can be opened
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ship_link::config::Config;
    /// use ship_link::serial::XbeeSerial;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// let serial = XbeeSerial::open(&config.serial)?;
    /// println!("Connected to: {}", serial.device_path());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let mut paths = vec![config.port.as_str()];
        paths.extend(
            DEFAULT_DEVICE_PATHS
                .iter()
                .copied()
                .filter(|path| *path != config.port),
        );
        Self::open_with_paths(&paths, config.baud_rate)
    }

    /// Open the first device in `paths` that accepts the connection
    ///
    /// # Arguments
    ///
    /// * `paths` - Device paths to try in order
    /// * `baud_rate` - UART speed of the radio
    ///
    /// # Returns
    ///
    /// * `Result<XbeeSerial>` - Connected serial port or error
    pub fn open_with_paths(paths: &[&str], baud_rate: u32) -> Result<Self> {
        for path in paths {
            debug!("Trying to open serial port: {}", path);

            match Self::open_port(path, baud_rate) {
                Ok(port) => {
                    info!("Opened XBee at {} ({} baud)", path, baud_rate);
                    return Ok(Self {
                        port,
                        device_path: path.to_string(),
                    });
                }
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                }
            }
        }

        Err(ShipLinkError::SerialPortNotFound(paths.join(", ")))
    }

    fn open_port(path: &str, baud_rate: u32) -> Result<SerialStream> {
        tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| ShipLinkError::Serial(format!("Failed to open {}: {}", path, e)))
    }

    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Split into the receive half and a frame writer
    pub fn into_split(
        self,
    ) -> (
        ReadHalf<SerialStream>,
        FrameWriter<TokioSerialPort<WriteHalf<SerialStream>>>,
    ) {
        let (reader, writer) = tokio::io::split(self.port);
        (reader, FrameWriter::new(TokioSerialPort::new(writer)))
    }
}

/// Writes complete API frames to the radio
pub struct FrameWriter<P> {
    port: P,
    frames_written: u64,
}

impl<P: SerialPortIO> FrameWriter<P> {
    pub fn new(port: P) -> Self {
        Self {
            port,
            frames_written: 0,
        }
    }

    /// Write and flush one encoded frame
    ///
    /// # Errors
    ///
    /// Returns [`ShipLinkError::Serial`] if the write or flush fails
    pub async fn send_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.port
            .write_all(frame)
            .await
            .map_err(|e| ShipLinkError::Serial(format!("Failed to write frame: {}", e)))?;

        self.port
            .flush()
            .await
            .map_err(|e| ShipLinkError::Serial(format!("Failed to flush serial port: {}", e)))?;

        self.frames_written += 1;
        debug!("Sent API frame ({} bytes)", frame.len());
        Ok(())
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

/// Post one [`Event::ByteReceived`] per byte read until the reader closes
///
/// While the queue is full the pump waits for the consumer instead of
/// dropping bytes; the radio side is buffered by the UART driver meanwhile.
/// The pump also stops once the consumer end of the queue is gone.
///
/// # Returns
///
/// * `Result<u64>` - Number of bytes read before end of stream
///
/// # Errors
///
/// Returns error if reading from the port fails
pub async fn pump_bytes<R: AsyncRead + Unpin>(mut reader: R, poster: EventPoster) -> Result<u64> {
    let mut buf = [0u8; READ_CHUNK];
    let mut total = 0u64;

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            debug!("Serial reader reached end of stream");
            return Ok(total);
        }
        total += n as u64;
        for &byte in &buf[..n] {
            if !poster.post_wait(Event::ByteReceived(byte)).await {
                debug!("Event queue closed, stopping serial reader");
                return Ok(total);
            }
        }
    }
}
