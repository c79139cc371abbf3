//! 投递与调度指标
//!
//! 所有指标以 `feesheets_` 为前缀，未安装 recorder 时为空操作。

use std::time::Duration;

use metrics::{counter, gauge, histogram};

/// 记录一次投递尝试
pub fn record_delivery_attempt(worksheet: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "feesheets_delivery_attempts_total",
        "worksheet" => worksheet.to_string(),
        "status" => status
    )
    .increment(1);
}

/// 记录重试耗尽的投递
pub fn record_delivery_exhausted(worksheet: &str) {
    counter!(
        "feesheets_delivery_exhausted_total",
        "worksheet" => worksheet.to_string()
    )
    .increment(1);
}

/// 记录发送给投递程序的信号 (`interrupt` / `kill`)
pub fn record_signal_sent(kind: &'static str) {
    counter!("feesheets_signals_sent_total", "kind" => kind).increment(1);
}

/// 记录一次 fan-out 批次
pub fn record_batch(size: usize, failed: usize) {
    histogram!("feesheets_batch_size").record(size as f64);
    counter!("feesheets_batches_total").increment(1);
    if failed > 0 {
        counter!("feesheets_batches_partial_total").increment(1);
        counter!("feesheets_batch_failed_payloads_total").increment(failed as u64);
    }
}

/// 记录一次任务执行
pub fn record_job_run(job: &str, success: bool, elapsed: Duration) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "feesheets_job_runs_total",
        "job" => job.to_string(),
        "status" => status
    )
    .increment(1);
    histogram!("feesheets_job_run_duration_seconds", "job" => job.to_string())
        .record(elapsed.as_secs_f64());
    gauge!("feesheets_job_last_run_success", "job" => job.to_string())
        .set(if success { 1.0 } else { 0.0 });
}
