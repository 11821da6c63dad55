//! Run the bridge against real serial ports.
//!
//! Either load a JSON config with `--config`, or describe a single device
//! on the command line with `--port`. Telemetry is written to stdout as
//! JSON lines unless `--log-telemetry` is given.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Parser;
use imu_bridge::{
    Bridge, BridgeConfig, DeviceConfig, JsonLinesPublisher, SerialOpener, TelemetryPublisher,
    TracingPublisher, TracingStatusSink,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "imu_bridge")]
#[command(about = "Decode and publish WitMotion IMU/GNSS telemetry from serial ports")]
#[command(version)]
struct Args {
    /// JSON configuration file
    #[arg(long, conflicts_with = "port")]
    config: Option<PathBuf>,

    /// Serial port of a single device
    #[arg(long)]
    port: Option<String>,

    /// Output rate for --port
    #[arg(long, default_value = "10Hz")]
    rate: String,

    /// Heading offset in degrees for --port
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    heading_offset: f64,

    /// Run accelerometer calibration once after connecting (--port)
    #[arg(long)]
    calibrate: bool,

    /// Reset the angle reference once after connecting (--port)
    #[arg(long)]
    reset_angle: bool,

    /// Drop datasets with failing sub-record checksums
    #[arg(long)]
    enforce_checksum: bool,

    /// Baud rate, overriding the config file
    #[arg(long)]
    baud: Option<u32>,

    /// Log telemetry instead of writing JSON lines to stdout
    #[arg(long)]
    log_telemetry: bool,
}

fn load_config(args: &Args) -> Result<BridgeConfig> {
    let mut config = match (&args.config, &args.port) {
        (Some(path), _) => BridgeConfig::load(path)?,
        (None, Some(port)) => {
            let device = DeviceConfig {
                heading_offset: args.heading_offset,
                calibrate: args.calibrate,
                reset_angle: args.reset_angle,
                ..DeviceConfig::from_args(port, &args.rate)?
            };
            BridgeConfig::new(vec![device])
        }
        (None, None) => bail!("Either --config or --port is required"),
    };

    if args.enforce_checksum {
        config.decoder.enforce_checksum = true;
    }
    if let Some(baud) = args.baud {
        config.baud_rate = baud;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = load_config(&args)?;
    info!(
        "Bridging {} device(s) at {} baud",
        config.devices.len(),
        config.baud_rate
    );

    let opener = Arc::new(SerialOpener::new(config.baud_rate));
    let mut bridge = Bridge::start(&mut config, opener)?;

    let mut publisher: Box<dyn TelemetryPublisher> = if args.log_telemetry {
        Box::new(TracingPublisher)
    } else {
        Box::new(JsonLinesPublisher::new(std::io::stdout()))
    };
    let mut status = TracingStatusSink;

    tokio::select! {
        _ = bridge.run(publisher.as_mut(), &mut status) => {
            info!("All devices stopped");
        }
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Shutting down");
        }
    }
    bridge.shutdown();
    Ok(())
}
