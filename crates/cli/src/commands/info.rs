//! `info` command implementation.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use contracts::SheetsBlueprint;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::registry::JobRegistry;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    snapshot_dir: String,
    delivery: DeliveryInfo,
    jobs: Vec<JobInfo>,
}

#[derive(Serialize)]
struct DeliveryInfo {
    max_attempts: u32,
    interrupt_after_secs: f64,
    kill_after_secs: f64,
}

#[derive(Serialize)]
struct JobInfo {
    name: String,
    period_secs: u64,
    offset_secs: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    worksheets: Vec<String>,
    next_run: Option<DateTime<Utc>>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let info = build_config_info(&blueprint, Utc::now());
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(blueprint: &SheetsBlueprint, now: DateTime<Utc>) -> ConfigInfo {
    let jobs = blueprint
        .jobs
        .iter()
        .map(|job| {
            let next_run = scheduler::initial_delay(now, job.period(), job.offset())
                .and_then(|delay| chrono::Duration::from_std(delay).ok())
                .and_then(|delay| now.checked_add_signed(delay));
            JobInfo {
                name: job.name.clone(),
                period_secs: job.period_secs,
                offset_secs: job.offset_secs,
                worksheets: JobRegistry::sheet_set(&job.name)
                    .map(|set| set.worksheets().map(str::to_string).collect())
                    .unwrap_or_default(),
                next_run,
            }
        })
        .collect();

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        snapshot_dir: blueprint.source.snapshot_dir.display().to_string(),
        delivery: DeliveryInfo {
            max_attempts: blueprint.delivery.max_attempts,
            interrupt_after_secs: blueprint.delivery.interrupt_after().as_secs_f64(),
            kill_after_secs: blueprint.delivery.kill_after().as_secs_f64(),
        },
        jobs,
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("\n=== Configuration ===\n");
    println!("Version: {}", info.version);
    println!("Snapshot dir: {}", info.snapshot_dir);
    println!(
        "Delivery: {} attempt(s), interrupt after {}s, kill after {}s",
        info.delivery.max_attempts,
        info.delivery.interrupt_after_secs,
        info.delivery.kill_after_secs
    );

    println!("\nJobs ({}):", info.jobs.len());
    for job in &info.jobs {
        let next_run = job
            .next_run
            .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "  - {} every {}s (+{}s), next run {}",
            job.name, job.period_secs, job.offset_secs, next_run
        );
        if job.worksheets.is_empty() {
            println!("      (unknown job)");
        } else {
            println!("      worksheets: {}", job.worksheets.join(", "));
        }
    }
    println!();
}
