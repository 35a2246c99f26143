//! # Antenna Monitor & Control
//!
//! Starts the log sink, the monitor point bus and its broadcast server, one
//! motion controller per discovered antenna and the command console and
//! server, then waits for a `stop` command or SIGINT and shuts everything
//! down in order.

use clap::Parser;
use hwmc::config::FabricConfig;
use hwmc::context::FabricContext;
use hwmc::error::FabricError;
use hwmc::fabric::Fabric;
use hwmc::logging::{LogSink, LogSinkLayer};
use hwmc_common::config::ConfigLoader;
use hwmc_common::shutdown::Shutdown;
use hwmc_hal::DriverRegistry;
use hwmc_hal::drivers::simulation;
use std::path::PathBuf;
use std::process;
use std::thread;
use tracing::{Level, error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Antenna hardware monitor & control
#[derive(Parser, Debug)]
#[command(name = "hwmc")]
#[command(version)]
#[command(about = "Monitor point bus, command distribution and motion control for an antenna array")]
struct Args {
    /// Path to the fabric configuration TOML. Defaults apply when omitted.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Use the simulation driver regardless of configuration.
    #[arg(short, long)]
    simulate: bool,

    /// Number of antennas (overrides configuration).
    #[arg(short = 'n', long)]
    antennas: Option<u16>,

    /// Do not read commands from stdin.
    #[arg(long)]
    no_console: bool,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    let config = load_config(&args);
    let min_severity = config
        .as_ref()
        .map(|c| c.shared.log_level)
        .unwrap_or_default();
    let log_rx = setup_tracing(&args, min_severity);

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!(fatal = true, "FATAL: {e}");
            process::exit(1);
        }
    };

    let sink = match LogSink::open(&config.logging.file_prefix, log_rx) {
        Ok(sink) => sink,
        Err(e) => {
            error!(fatal = true, "FATAL: cannot open log file: {e}");
            process::exit(1);
        }
    };
    info!("Logging to {}", sink.path().display());
    let log_stop = Shutdown::new();
    let log_thread = {
        let token = log_stop.clone();
        thread::Builder::new()
            .name("log-sink".to_string())
            .spawn(move || sink.run(&token))
    };

    info!(
        "{} v{} starting...",
        config.shared.service_name,
        env!("CARGO_PKG_VERSION")
    );
    let code = match run(&config) {
        Ok(()) => {
            info!("{} shutdown complete", config.shared.service_name);
            0
        }
        Err(e) => {
            error!(fatal = true, "FATAL: {e}");
            1
        }
    };

    log_stop.trigger();
    match log_thread {
        Ok(handle) => {
            let _ = handle.join();
        }
        Err(e) => eprintln!("log sink thread did not start: {e}"),
    }
    process::exit(code);
}

fn run(config: &FabricConfig) -> Result<(), FabricError> {
    let registry = DriverRegistry::with_builtin();
    let context = FabricContext::new();

    let signal = context.clone();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        signal.request_stop();
    })
    .map_err(|e| FabricError::Signal(e.to_string()))?;

    let fabric = Fabric::start(config, &registry, context)?;
    fabric.wait();
    fabric.shutdown();
    Ok(())
}

/// Load, apply command-line overrides, validate.
fn load_config(args: &Args) -> Result<FabricConfig, FabricError> {
    let mut config = match &args.config {
        Some(path) => FabricConfig::load(path)?,
        None => FabricConfig::default(),
    };
    if args.simulate {
        config.hardware.driver = simulation::DRIVER_NAME.to_string();
    }
    if let Some(n) = args.antennas {
        config.hardware.antennas = n;
    }
    if args.no_console {
        config.command.console = false;
    }
    config.validate()?;
    Ok(config)
}

/// Stderr output filtered by `RUST_LOG` / `-v`, plus the persisted log
/// sink filtered by the configured severity.
fn setup_tracing(
    args: &Args,
    min_severity: hwmc_common::config::Severity,
) -> flume::Receiver<hwmc::logging::LogEntry> {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let console = if args.json {
        fmt::layer()
            .with_writer(std::io::stderr)
            .json()
            .with_filter(filter)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .compact()
            .with_filter(filter)
            .boxed()
    };

    let (sink_layer, rx) = LogSinkLayer::channel(min_severity);
    tracing_subscriber::registry()
        .with(console)
        .with(sink_layer)
        .init();
    rx
}
