//! # feesheets CLI
//!
//! 命令行接口入口点。
//!
//! 提供：
//! - 配置加载与验证
//! - 定时任务编排与生命周期管理
//! - 优雅关闭处理

mod cli;
mod commands;
mod error;
mod registry;
mod report;

use anyhow::Result;
use clap::Parser;
use observability::{LoggingGuard, ObservabilityConfig};
use tracing::info;

use cli::{Cli, Commands};
use commands::{run_info, run_once, run_scheduler, run_validate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Held until exit so buffered file logs are flushed
    let _logging = init_logging(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "feesheets starting");

    let result = match &cli.command {
        Commands::Run(args) => run_scheduler(args).await,
        Commands::Once(args) => run_once(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Info(args) => run_info(args),
    };

    if let Err(ref e) = result {
        tracing::error!(error = %format!("{e:#}"), "Command failed");
    }

    result
}

/// Initialize logging based on CLI options
fn init_logging(cli: &Cli) -> Result<LoggingGuard> {
    observability::init_with_config(ObservabilityConfig {
        log_format: cli.log_format.into(),
        metrics_port: None,
        default_log_level: ObservabilityConfig::level_from_verbosity(cli.verbose, cli.quiet)
            .to_string(),
        log_file: cli.log_file.clone(),
    })
}
