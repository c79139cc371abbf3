//! `once` command implementation.

use std::sync::Arc;

use anyhow::Result;
use contracts::{JobSpec, SheetsBlueprint};
use scheduler::SystemClock;
use tokio::time::Instant;
use tracing::{error, info};

use super::{DeliveryStack, load_blueprint};
use crate::cli::OnceArgs;
use crate::error::CliError;
use crate::registry::JobRegistry;

/// Execute the `once` command
///
/// Runs the selected jobs one after another, immediately. Any failure makes
/// the command fail once every job has been attempted.
pub async fn run_once(args: &OnceArgs) -> Result<()> {
    let blueprint = load_blueprint(&args.config)?;
    let specs = select_jobs(&blueprint, &args.jobs)?;

    let stack = DeliveryStack::new(&blueprint, &args.delivery);
    let jobs = JobRegistry::build(
        &specs,
        Arc::clone(&stack.source),
        stack.fanout.clone(),
        Arc::new(SystemClock),
    )?;

    let total = jobs.len();
    let mut failed = 0;
    for job in &jobs {
        let started = Instant::now();
        let result = job.run_once().await;
        observability::record_job_run(job.name(), result.is_ok(), started.elapsed());

        match result {
            Ok(()) => info!(job = job.name(), elapsed = ?started.elapsed(), "Job finished"),
            Err(e) => {
                failed += 1;
                error!(job = job.name(), error = %format!("{e:#}"), "Job failed");
            }
        }
    }

    if failed > 0 {
        return Err(CliError::JobsFailed { failed, total }.into());
    }
    Ok(())
}

/// Requested jobs in command-line order, or every configured job
fn select_jobs(
    blueprint: &SheetsBlueprint,
    requested: &[String],
) -> Result<Vec<JobSpec>, CliError> {
    if requested.is_empty() {
        return Ok(blueprint.jobs.clone());
    }

    requested
        .iter()
        .map(|name| {
            blueprint.job(name).cloned().ok_or_else(|| CliError::NotConfigured {
                name: name.clone(),
                configured: blueprint
                    .jobs
                    .iter()
                    .map(|j| j.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
        })
        .collect()
}
