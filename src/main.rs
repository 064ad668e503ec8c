//! # Ship Link
//!
//! Drives a ship over an XBee radio link.
//!
//! The serial reader task posts every received byte into the event queue;
//! this loop is the single consumer that runs the link receiver and the ship
//! session one event at a time.

use anyhow::{bail, Context, Result};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use ship_link::config::{Config, LoggingConfig};
use ship_link::framework::scheduler::Scheduler;
use ship_link::framework::Event;
use ship_link::serial::{pump_bytes, XbeeSerial};
use ship_link::ship::SimulatedHardware;

/// Configuration file used when none is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Log file name prefix inside `[logging] directory`
const LOG_FILE_PREFIX: &str = "ship-link.log";

/// One iteration of the consumer loop
enum Step {
    Event(Option<Event>),
    Tick(Instant),
    Shutdown,
}

/// Main entry point for Ship Link
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (first argument or `config/default.toml`)
///    - Set up logging to stdout and optionally a daily log file
///    - Open the XBee serial port and spawn the receive pump
///
/// 2. **Main Loop**
///    - Dispatch queued events to the link receiver and ship session
///    - Advance timers and sample the fuel sensor every tick
///    - Run the events raised while handling the step
///    - Write every ready outbound frame and report its completion
///
/// 3. **Graceful Shutdown**
///    - Stop the actuators on Ctrl+C
///
/// # Errors
///
/// Returns error if the configuration is invalid or no XBee device is found
///
/// # Examples
///
/// ```bash
/// cargo run --release -- config/default.toml
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;

    let _log_guard = init_logging(&config.logging);

    info!("Ship Link v{} starting...", env!("CARGO_PKG_VERSION"));
    info!(
        "Local address 0x{:04X}, home team {:?}",
        config.link.local_address, config.ship.home_color
    );

    let serial = XbeeSerial::open(&config.serial)?;
    info!("XBee serial port opened at: {}", serial.device_path());
    let (reader, mut writer) = serial.into_split();

    let hardware = SimulatedHardware::new(config.ship.home_color, config.ship.fuel_empty);
    let mut scheduler = Scheduler::new(&config, hardware);

    let byte_poster = scheduler.poster();
    tokio::spawn(async move {
        match pump_bytes(reader, byte_poster).await {
            Ok(total) => warn!("Serial reader closed after {} bytes", total),
            Err(e) => error!("Serial reader failed: {}", e),
        }
    });

    if !scheduler.init() {
        bail!("Event queue rejected the initial events");
    }

    let mut ticker = interval(config.link.tick());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_tick = Instant::now();

    info!("Press Ctrl+C to exit");

    loop {
        let step = tokio::select! {
            event = scheduler.next_event() => Step::Event(event),
            now = ticker.tick() => Step::Tick(now),
            _ = tokio::signal::ctrl_c() => Step::Shutdown,
        };

        match step {
            Step::Event(Some(event)) => scheduler.dispatch(event),
            Step::Event(None) => break,
            Step::Tick(now) => {
                scheduler.tick(now.saturating_duration_since(last_tick));
                last_tick = now;
            }
            Step::Shutdown => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }

        scheduler.run_deferred();

        while let Some(frame) = scheduler.take_ready_frame() {
            if let Err(e) = writer.send_frame(&frame).await {
                warn!("Dropped outbound frame: {}", e);
            }
            scheduler.transmit_complete();
        }
    }

    scheduler.shutdown();
    info!("Total frames written: {}", writer.frames_written());
    Ok(())
}

/// Install the tracing subscriber
///
/// `RUST_LOG` overrides the configured level. The returned guard flushes the
/// log file and must live until exit.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match &config.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
            let (file_writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .with(fmt::layer().with_ansi(false).with_writer(file_writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .init();
            None
        }
    }
}
