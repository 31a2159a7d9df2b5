//! Holder Monitor - token holder concentration and whale risk analysis
//!
//! Reads a holder snapshot (JSON), runs the analytics pipeline and prints
//! the report as JSON on stdout. Logs go to stderr.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

// Use the library crate
use holder_monitor::cli::commands::{self, ThresholdOverrides};
use holder_monitor::config::{Config, LoggingConfig};

/// Holder Monitor - token holder concentration analysis
#[derive(Parser)]
#[command(name = "holder-monitor")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a holder snapshot and print the report
    Analyze {
        /// Snapshot JSON file (token, holders, optional activity)
        snapshot: PathBuf,

        /// Pretty-print the JSON report
        #[arg(long)]
        pretty: bool,

        /// Override the whale USD threshold
        #[arg(long)]
        whale_threshold_usd: Option<f64>,

        /// Override the whale percent-of-supply threshold
        #[arg(long)]
        whale_threshold_percent: Option<f64>,

        /// Override the large-transfer alert threshold in USD
        #[arg(long)]
        alert_threshold_usd: Option<f64>,
    },

    /// Show current configuration
    Config {
        /// Print as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// List the known exchange/DEX addresses in effect
    Entities,
}

fn init_tracing(logging: &LoggingConfig) {
    let default_directive = format!("holder_monitor={}", logging.level);
    let filter = match default_directive.parse::<Directive>() {
        Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
        Err(_) => EnvFilter::from_default_env(),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            init_tracing(&LoggingConfig::default());
            error!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize tracing
    init_tracing(&config.logging);
    info!(config = %cli.config, policy = %config.risk_policy.version, "Configuration loaded");

    // Execute command
    let result = match cli.command {
        Commands::Analyze {
            snapshot,
            pretty,
            whale_threshold_usd,
            whale_threshold_percent,
            alert_threshold_usd,
        } => {
            let overrides = ThresholdOverrides {
                whale_threshold_usd,
                whale_threshold_percent,
                alert_threshold_usd,
            };
            commands::analyze(&config, &snapshot, overrides, pretty)
        }
        Commands::Config { json } => commands::show_config(&config, json),
        Commands::Entities => commands::list_entities(&config),
    };

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
