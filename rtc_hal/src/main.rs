//! # RTC Node Binary
//!
//! Loads a node configuration, generates the registration code for its
//! RX8025 clocks and runs it.
//!
//! # Usage
//!
//! ```bash
//! # Validate configuration
//! rtc_hal --config node.toml check
//!
//! # Print generated code
//! rtc_hal --config node.toml generate --format json
//!
//! # Run against simulated buses, one tick only
//! rtc_hal --config node.toml -v run --simulate --once
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use rtc_common::codegen::statement::Statement;
use rtc_common::codegen::{generate, validate_config};
use rtc_common::config::{ConfigLoader, NodeConfig};
use rtc_common::consts::DEFAULT_CONFIG_PATH;
use rtc_hal::bus::{BusProvider, LinuxBusProvider, SimulatedBusProvider};
use rtc_hal::clock::SystemWallClock;
use rtc_hal::drivers::rx8025::RegisterBlock;
use rtc_hal::{DriverRegistry, NodeCore};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Instant;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

/// RTC Node - RX8025 configuration, code generation and runtime
#[derive(Parser, Debug)]
#[command(name = "rtc_hal")]
#[command(version)]
#[command(about = "RX8025 real-time clock node: configuration check, code generation and runtime")]
#[command(long_about = None)]
struct Args {
    /// Path to node configuration file (node.toml)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Enable verbose logging (overrides shared.log_level)
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the configuration and every id reference
    Check,

    /// Print the generated code
    Generate {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Execute the generated code
    Run {
        /// Use simulated I2C buses with freshly powered-on clocks
        #[arg(short = 's', long)]
        simulate: bool,

        /// Set up, run a single tick and exit
        #[arg(long)]
        once: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = run() {
        error!("RTC node failed: {}", e);
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loaded = NodeConfig::load(&args.config);
    let level = match &loaded {
        Ok(config) => config.shared.log_level.as_tracing_level(),
        Err(_) => Level::INFO,
    };
    setup_tracing(&args, level);

    let config = loaded.map_err(|e| format!("{}: {}", args.config.display(), e))?;
    info!(
        "RTC node v{} ({}) starting...",
        env!("CARGO_PKG_VERSION"),
        config.shared.service_name
    );

    match args.command {
        Command::Check => {
            validate_config(&config)?;
            info!("Configuration {} is valid", args.config.display());
        }
        Command::Generate { format } => {
            let code = generate(&config)?;
            match format {
                OutputFormat::Text => print!("{code}"),
                OutputFormat::Json => println!("{}", code.to_json()?),
            }
        }
        Command::Run { simulate, once } => run_node(&config, simulate, once)?,
    }

    Ok(())
}

fn run_node(
    config: &NodeConfig,
    simulate: bool,
    once: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let code = generate(config)?;
    info!("Generated {} statements", code.len());

    let registry = DriverRegistry::with_builtin_drivers();
    let mut drivers = registry.list_drivers();
    drivers.sort_unstable();
    info!("Registered drivers: {:?}", drivers);
    let wall = Arc::new(SystemWallClock);

    let provider: Box<dyn BusProvider> = if simulate {
        info!("Simulation mode enabled");
        let provider = SimulatedBusProvider::new();
        for statement in code.statements() {
            if let Statement::RegisterI2cDevice { bus, address, .. } = statement {
                provider
                    .bus(bus)
                    .add_device(*address, RegisterBlock::power_on().as_bytes());
            }
        }
        Box::new(provider)
    } else {
        Box::new(LinuxBusProvider)
    };

    let mut core = NodeCore::from_code(&code, &registry, provider.as_ref(), wall)?;

    let running = core.running_flag();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        running.store(false, Ordering::SeqCst);
    })?;

    core.setup();

    if once {
        core.tick(Instant::now());
    } else if let Err(e) = core.run() {
        error!("Node loop error: {}", e);
    }

    core.shutdown();
    info!("RTC node shutdown complete");
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and configured level.
fn setup_tracing(args: &Args, configured: Level) {
    let level = if args.verbose { Level::DEBUG } else { configured };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
