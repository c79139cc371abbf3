//! Run statistics printed when the scheduler stops.

use std::time::Duration;

use dispatcher::MetricsSnapshot;
use scheduler::JobSummary;

/// Statistics from a scheduler run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Wall time between start and shutdown
    pub duration: Duration,

    /// Per-job run counts
    pub jobs: Vec<JobSummary>,

    /// Delivery counters (absent for dry runs)
    pub sink: Option<MetricsSnapshot>,
}

impl RunReport {
    pub fn total_runs(&self) -> u64 {
        self.jobs.iter().map(|j| j.runs).sum()
    }

    pub fn total_failures(&self) -> u64 {
        self.jobs.iter().map(|j| j.failures).sum()
    }

    /// Render the summary block
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("\n=== Run Summary ===\n\n");
        out.push_str(&format!("Duration: {:.1}s\n", self.duration.as_secs_f64()));
        out.push_str(&format!(
            "Runs: {} ({} failed)\n",
            self.total_runs(),
            self.total_failures()
        ));

        if !self.jobs.is_empty() {
            out.push_str("\nJobs:\n");
            for job in &self.jobs {
                out.push_str(&format!(
                    "  - {:<8} runs={} failures={}\n",
                    job.name, job.runs, job.failures
                ));
            }
        }

        if let Some(sink) = &self.sink {
            out.push_str("\nDeliveries:\n");
            out.push_str(&format!("  Attempts: {}\n", sink.attempts));
            out.push_str(&format!("  Delivered: {}\n", sink.successes));
            out.push_str(&format!("  Failed attempts: {}\n", sink.failed_attempts));
            out.push_str(&format!("  Gave up: {}\n", sink.exhausted));
            out.push_str(&format!(
                "  Signals: {} interrupt, {} kill\n",
                sink.interrupts_sent, sink.kills_sent
            ));
        }

        out
    }

    pub fn print_summary(&self) {
        println!("{}", self.render());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_totals() {
        let report = RunReport {
            duration: Duration::from_secs(3600),
            jobs: vec![
                JobSummary {
                    name: "1m".into(),
                    runs: 60,
                    failures: 2,
                },
                JobSummary {
                    name: "profile".into(),
                    runs: 2,
                    failures: 0,
                },
            ],
            sink: Some(MetricsSnapshot {
                attempts: 70,
                successes: 60,
                kills_sent: 1,
                ..Default::default()
            }),
        };

        let text = report.render();
        assert!(text.contains("Runs: 62 (2 failed)"));
        assert!(text.contains("Attempts: 70"));
        assert!(text.contains("Signals: 0 interrupt, 1 kill"));
    }

    #[test]
    fn test_dry_run_has_no_delivery_block() {
        let report = RunReport::default();
        assert!(!report.render().contains("Deliveries:"));
    }
}
