//! # VFD Link
//!
//! Runs the spindle link stack against the built-in simulated drive: loads
//! the TOML configuration, initializes the controller (which starts the
//! background bus task), performs a short jog sequence and then reports the
//! drive status until interrupted.
//!
//! Real deployments embed [`vfd_link::SpindleController`] into the machine
//! firmware and provide a hardware [`vfd_link::SerialLink`]; this binary is
//! the development rig for everything above the UART.

use clap::Parser;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

use vfd_common::config::{ConfigError, ConfigLoader, LinkSettings, SharedConfig, VfdLinkConfig};
use vfd_common::fault::NullHook;
use vfd_common::state::SpindleState;
use vfd_link::SpindleController;
use vfd_link::link::SimulatedVfd;
use vfd_link::vendor::builtin_registry;

/// VFD spindle link — simulated drive rig
#[derive(Parser, Debug)]
#[command(name = "vfd_link")]
#[command(version)]
#[command(about = "Spindle link protocol engine against a simulated drive")]
struct Args {
    /// Path to the link configuration TOML.
    #[arg(default_value = "config/vfd.toml")]
    config: PathBuf,

    /// Target RPM for the jog sequence.
    #[arg(long, default_value_t = 6000)]
    rpm: u32,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();
    setup_tracing(&args);

    info!("VFD link v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args) {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("VFD link shutdown complete");
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&args.config)?;

    let drive = SimulatedVfd::new();
    let registry = builtin_registry();
    let protocol = registry.create(&config.spindle.vendor)?;

    let controller = SpindleController::new(
        config.spindle.clone(),
        config.link.clone(),
        protocol,
        Box::new(drive),
        Arc::new(NullHook),
    );
    controller.init()?;

    // Graceful shutdown flag.
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("received shutdown signal");
        r.store(false, Ordering::SeqCst);
    })?;

    info!("jog: enabling spindle clockwise at {} RPM", args.rpm);
    controller.set_state(SpindleState::EnabledClockwise, args.rpm);

    let device = controller.device();
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_secs(1));
        info!(
            "drive status: state={:?} rpm={} unresponsive={}",
            controller.get_state(),
            device.current_rpm(),
            controller.is_unresponsive()
        );
    }

    info!("jog: stopping spindle");
    controller.stop();

    Ok(())
}

/// Load the configuration file, falling back to built-in defaults when the
/// file does not exist (the simulated drive needs no real device path).
fn load_config(path: &PathBuf) -> Result<VfdLinkConfig, ConfigError> {
    match VfdLinkConfig::load(path) {
        Ok(config) => {
            config.validate()?;
            info!("loaded configuration from {}", path.display());
            Ok(config)
        }
        Err(ConfigError::FileNotFound) => {
            warn!(
                "no configuration at {}, using built-in defaults",
                path.display()
            );
            Ok(VfdLinkConfig {
                shared: SharedConfig {
                    log_level: Default::default(),
                    service_name: "vfd-link-sim".to_string(),
                },
                link: LinkSettings {
                    device: "sim".to_string(),
                    baud_rate: 9600,
                    data_bits: 8,
                    stop_bits: 1,
                    parity: Default::default(),
                    bus_address: 1,
                },
                spindle: Default::default(),
            })
        }
        Err(e) => Err(e),
    }
}

/// Setup tracing subscriber based on CLI arguments.
fn setup_tracing(args: &Args) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
