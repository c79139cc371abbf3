//! 时间戳工作表
//!
//! 一列 `timestr`，一行 UTC 时间，格式 `16 Oct 26 12:00 UTC`。

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// 时间戳 CSV 的表头
pub const TIMESTAMP_HEADER: &str = "timestr";

/// 生成时间戳 CSV
pub fn timestamp_csv(now: DateTime<Utc>) -> Bytes {
    Bytes::from(format!(
        "{TIMESTAMP_HEADER}\n{}\n",
        now.format("%d %b %y %H:%M UTC")
    ))
}
