//! 墙钟相位对齐

use std::time::Duration;

use chrono::{DateTime, Utc};

/// 首次执行前的等待时间
///
/// `period - (now mod period) + offset`，以 Unix 纪元毫秒计算。
/// `now` 恰好落在边界上时等待整整一个周期；`offset >= period` 时等待
/// 会超过一个周期。结果无法用 `Duration` 表示时返回 `None`。
pub fn initial_delay(now: DateTime<Utc>, period: Duration, offset: Duration) -> Option<Duration> {
    let period_ms = i64::try_from(period.as_millis()).unwrap_or(i64::MAX);
    if period_ms == 0 {
        return Some(offset);
    }
    let phase_ms = now.timestamp_millis().rem_euclid(period_ms);
    Duration::from_millis((period_ms - phase_ms) as u64).checked_add(offset)
}
