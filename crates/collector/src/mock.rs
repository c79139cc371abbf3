//! Mock 数据源
//!
//! 用于无渲染器环境的测试：内存中的序列表，可注入失败。

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use contracts::{ContractError, PayloadSource};

/// 内存数据源
#[derive(Debug, Default)]
pub struct StaticSource {
    series: HashMap<String, Bytes>,
    failing: HashSet<String>,
    renders: AtomicU64,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加一个序列
    pub fn with_series(mut self, series: impl Into<String>, body: impl Into<Bytes>) -> Self {
        self.series.insert(series.into(), body.into());
        self
    }

    /// 让某个序列渲染失败
    pub fn failing(mut self, series: impl Into<String>) -> Self {
        self.failing.insert(series.into());
        self
    }

    /// 已调用 render 的次数
    pub fn renders(&self) -> u64 {
        self.renders.load(Ordering::Relaxed)
    }
}

impl PayloadSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn render(&self, series: &str) -> Result<Bytes, ContractError> {
        self.renders.fetch_add(1, Ordering::Relaxed);

        if self.failing.contains(series) {
            return Err(ContractError::source_read(
                self.name(),
                series,
                "injected failure",
            ));
        }

        self.series
            .get(series)
            .cloned()
            .ok_or_else(|| ContractError::source_read(self.name(), series, "unknown series"))
    }
}
