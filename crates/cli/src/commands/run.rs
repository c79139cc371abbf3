//! `run` command implementation.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use observability::{Logger, TracingLogger};
use scheduler::{Clock, JobSummary, PeriodicScheduler, SystemClock};
use tokio::time::Instant;
use tracing::{error, info, warn};

use super::{DeliveryStack, load_blueprint};
use crate::cli::RunArgs;
use crate::registry::JobRegistry;
use crate::report::RunReport;

/// Execute the `run` command
pub async fn run_scheduler(args: &RunArgs) -> Result<()> {
    let blueprint = load_blueprint(&args.config)?;

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let stack = DeliveryStack::new(&blueprint, &args.delivery);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let jobs = JobRegistry::build(
        &blueprint.jobs,
        Arc::clone(&stack.source),
        stack.fanout.clone(),
        Arc::clone(&clock),
    )?;

    let logger: Arc<dyn Logger> = Arc::new(TracingLogger);
    let mut scheduler = PeriodicScheduler::new(logger, clock);
    for job in jobs {
        scheduler.spawn(job)?;
    }

    info!(
        jobs = scheduler.len(),
        dry_run = args.delivery.dry_run,
        "Scheduler started"
    );

    let started = Instant::now();
    let (jobs, signal) = stop_on_signal(scheduler, shutdown_signal()).await;
    let report = RunReport {
        duration: started.elapsed(),
        jobs,
        sink: stack.sink.metrics().map(|m| m.snapshot()),
    };

    info!(
        runs = report.total_runs(),
        failures = report.total_failures(),
        duration_secs = report.duration.as_secs_f64(),
        "Scheduler stopped"
    );
    report.print_summary();

    signal
}

/// Wait for `signal` or the scheduler token, then shut the scheduler down
///
/// Jobs are joined before a failed `signal` is reported, so a delivery in
/// flight is never aborted.
async fn stop_on_signal<F>(
    scheduler: PeriodicScheduler,
    signal: F,
) -> (Vec<JobSummary>, Result<()>)
where
    F: Future<Output = Result<()>>,
{
    let result = tokio::select! {
        result = signal => {
            match &result {
                Ok(()) => warn!("Received shutdown signal, stopping scheduler..."),
                Err(e) => error!(
                    error = %format!("{e:#}"),
                    "Signal handling failed, stopping scheduler"
                ),
            }
            result
        }
        _ = scheduler.cancelled() => Ok(()),
    };

    (scheduler.shutdown().await, result)
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate =
            signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.context("Failed to install Ctrl+C handler")?,
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c()
        .await
        .context("Failed to install Ctrl+C handler")?;

    Ok(())
}
