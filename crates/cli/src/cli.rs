//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use contracts::DeliveryTarget;
use std::path::PathBuf;

/// feesheets - periodic delivery of fee-estimation metrics to a spreadsheet
#[derive(Parser, Debug)]
#[command(
    name = "feesheets",
    author,
    version,
    about = "Deliver rendered metric series to spreadsheet worksheets on a schedule",
    long_about = "Renders metric series to CSV and pipes each one into an external delivery \n\
                  program (one worksheet per invocation), on wall-clock aligned periods. \n\
                  Failed deliveries are retried; overrunning programs are interrupted, then killed."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "FEESHEETS_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "FEESHEETS_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true, env = "FEESHEETS_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run every configured job on its schedule until interrupted
    Run(RunArgs),

    /// Run jobs once, immediately, and exit
    Once(OnceArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configured jobs and their next aligned run
    Info(InfoArgs),
}

/// Where and how payloads are delivered
#[derive(Args, Debug, Clone)]
pub struct DeliveryArgs {
    /// Delivery program, invoked as `<bin> <spreadsheet> <worksheet> <auth>`
    #[arg(long = "bin", env = "FEESHEETS_BIN")]
    pub bin: PathBuf,

    /// Spreadsheet identifier
    #[arg(long, env = "FEESHEETS_SPREADSHEET")]
    pub spreadsheet: String,

    /// Credential reference handed to the delivery program
    #[arg(long, env = "FEESHEETS_AUTH")]
    pub auth: PathBuf,

    /// Log payloads instead of invoking the delivery program
    #[arg(long)]
    pub dry_run: bool,
}

impl DeliveryArgs {
    pub fn target(&self) -> DeliveryTarget {
        DeliveryTarget::new(&self.bin, &self.spreadsheet, &self.auth)
    }
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "feesheets.toml", env = "FEESHEETS_CONFIG")]
    pub config: PathBuf,

    #[command(flatten)]
    pub delivery: DeliveryArgs,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "FEESHEETS_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `once` command
#[derive(Parser, Debug, Clone)]
pub struct OnceArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "feesheets.toml", env = "FEESHEETS_CONFIG")]
    pub config: PathBuf,

    #[command(flatten)]
    pub delivery: DeliveryArgs,

    /// Job to run (repeatable; all configured jobs when absent)
    #[arg(long = "job", value_name = "NAME")]
    pub jobs: Vec<String>,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "feesheets.toml", env = "FEESHEETS_CONFIG")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "feesheets.toml", env = "FEESHEETS_CONFIG")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
