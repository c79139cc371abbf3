//! PeriodicScheduler - 每个任务一个 tokio task
//!
//! 任务状态：`Waiting -> Running -> Stopped`。取消只在等待点检查，
//! 正在执行的任务不会被打断。

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use contracts::JobSpec;
use observability::{Logger, log_debug, log_error, log_info, log_warn};
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info_span};

use crate::align::initial_delay;
use crate::clock::Clock;
use crate::error::SchedulerError;
use crate::job::{ScheduledJob, Task};

/// 任务退出时的统计
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSummary {
    pub name: String,
    /// 执行次数
    pub runs: u64,
    /// 其中失败的次数
    pub failures: u64,
}

impl JobSummary {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            runs: 0,
            failures: 0,
        }
    }
}

/// 相位对齐的周期调度器
pub struct PeriodicScheduler {
    logger: Arc<dyn Logger>,
    clock: Arc<dyn Clock>,
    token: CancellationToken,
    tasks: JoinSet<JobSummary>,
    names: HashSet<String>,
}

impl PeriodicScheduler {
    pub fn new(logger: Arc<dyn Logger>, clock: Arc<dyn Clock>) -> Self {
        Self {
            logger,
            clock,
            token: CancellationToken::new(),
            tasks: JoinSet::new(),
            names: HashSet::new(),
        }
    }

    /// 关闭令牌；取消它等同于开始关闭 (不等待任务结束)
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// 已启动的任务数
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// 启动一个任务
    pub fn spawn(&mut self, job: ScheduledJob) -> Result<(), SchedulerError> {
        if self.token.is_cancelled() {
            return Err(SchedulerError::ShuttingDown);
        }
        if job.spec.period_secs == 0 {
            return Err(SchedulerError::InvalidSpec {
                name: job.spec.name.clone(),
                reason: "period must be > 0".to_string(),
            });
        }
        let max = JobSpec::MAX_SECS;
        if job.spec.period_secs > max || job.spec.offset_secs > max {
            return Err(SchedulerError::InvalidSpec {
                name: job.spec.name.clone(),
                reason: format!("period and offset must be <= {max}s"),
            });
        }
        if !self.names.insert(job.spec.name.clone()) {
            return Err(SchedulerError::DuplicateJob {
                name: job.spec.name.clone(),
            });
        }

        let span = info_span!("job", job = %job.spec.name);
        let runner = JobRunner {
            spec: job.spec,
            task: job.task,
            logger: Arc::clone(&self.logger),
            clock: Arc::clone(&self.clock),
            token: self.token.clone(),
        };
        self.tasks.spawn(runner.run().instrument(span));
        Ok(())
    }

    /// 等待关闭令牌被取消 (外部信号或其他持有者)
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    /// 关闭：取消令牌，等待每个任务退出
    ///
    /// 正在执行的任务会跑完，之后不再开始新的执行。
    pub async fn shutdown(mut self) -> Vec<JobSummary> {
        self.token.cancel();
        log_info!(self.logger, "scheduler shutting down, waiting for {} job(s)", self.names.len());

        let mut summaries = Vec::with_capacity(self.names.len());
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(summary) => summaries.push(summary),
                Err(e) => log_error!(self.logger, "job task ended abnormally: {}", e),
            }
        }

        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        log_info!(self.logger, "scheduler stopped");
        summaries
    }
}

struct JobRunner {
    spec: JobSpec,
    task: Task,
    logger: Arc<dyn Logger>,
    clock: Arc<dyn Clock>,
    token: CancellationToken,
}

impl JobRunner {
    async fn run(self) -> JobSummary {
        let name = self.spec.name.as_str();
        let period = self.spec.period();
        let mut summary = JobSummary::new(name);

        // Waiting
        let Some(delay) = initial_delay(self.clock.now(), period, self.spec.offset()) else {
            log_error!(self.logger, "job {} has an unrepresentable first run, not scheduled", name);
            return summary;
        };
        log_info!(
            self.logger,
            "job {} scheduled: first run in {}, then every {}",
            name,
            human(delay),
            human(period)
        );

        let first = Instant::now() + delay;
        tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                log_info!(self.logger, "job {} cancelled before its first run", name);
                return summary;
            }
            _ = sleep_until(first) => {}
        }

        let mut ticker = interval_at(first + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            // Running
            summary.runs += 1;
            let started = Instant::now();
            let result = (self.task)().await;
            let elapsed = started.elapsed();
            observability::record_job_run(name, result.is_ok(), elapsed);

            match result {
                Ok(()) => log_debug!(self.logger, "job {} run {} finished in {:?}", name, summary.runs, elapsed),
                Err(e) => {
                    summary.failures += 1;
                    log_error!(self.logger, "job {} failed: {:#}", name, e);
                }
            }

            if elapsed > period {
                log_warn!(
                    self.logger,
                    "job {} took {:?}, longer than its period; missed ticks are skipped",
                    name,
                    elapsed
                );
            }

            tokio::select! {
                biased;
                _ = self.token.cancelled() => break,
                _ = ticker.tick() => {}
            }
        }

        // Stopped
        log_info!(
            self.logger,
            "job {} stopped after {} run(s), {} failure(s)",
            name,
            summary.runs,
            summary.failures
        );
        summary
    }
}

/// `1h30m5s` 形式
fn human(d: Duration) -> String {
    let total = d.as_secs();
    let (h, m, s) = (total / 3600, total / 60 % 60, total % 60);
    let millis = d.subsec_millis();
    let mut out = String::new();
    if h > 0 {
        out.push_str(&format!("{h}h"));
    }
    if m > 0 {
        out.push_str(&format!("{m}m"));
    }
    if s > 0 || out.is_empty() {
        if millis > 0 {
            out.push_str(&format!("{s}.{millis:03}s"));
        } else {
            out.push_str(&format!("{s}s"));
        }
    } else if millis > 0 {
        out.push_str(&format!("0.{millis:03}s"));
    }
    out
}
