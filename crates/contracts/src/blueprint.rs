//! SheetsBlueprint - Config Loader 输出
//!
//! 描述完整的运行配置：数据源、投递策略、定时任务列表。

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::DeliveryPolicy;

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的配置蓝图
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 指标数据源
    #[serde(default)]
    pub source: SourceConfig,

    /// 投递重试与超时策略
    #[serde(default)]
    pub delivery: DeliveryPolicy,

    /// 定时任务列表
    pub jobs: Vec<JobSpec>,
}

impl SheetsBlueprint {
    /// 按名称查找任务
    pub fn job(&self, name: &str) -> Option<&JobSpec> {
        self.jobs.iter().find(|job| job.name == name)
    }
}

/// 指标数据源配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// 外部渲染器输出 `<series>.csv` 的目录
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: PathBuf,
}

fn default_snapshot_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            snapshot_dir: default_snapshot_dir(),
        }
    }
}

/// 定时任务规格
///
/// 加载后不可变；`period_secs` 必须 > 0，`offset_secs` 通常位于 `[0, period)`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    /// 任务名称 (由 JobRegistry 解析)
    pub name: String,

    /// 周期 (秒)
    pub period_secs: u64,

    /// 相位偏移 (秒)
    #[serde(default)]
    pub offset_secs: u64,
}

impl JobSpec {
    /// `period_secs` 与 `offset_secs` 的上限 (366 天)
    pub const MAX_SECS: u64 = 366 * 24 * 60 * 60;

    pub fn new(name: impl Into<String>, period: Duration, offset: Duration) -> Self {
        Self {
            name: name.into(),
            period_secs: period.as_secs(),
            offset_secs: offset.as_secs(),
        }
    }

    /// 周期
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs)
    }

    /// 相位偏移
    pub fn offset(&self) -> Duration {
        Duration::from_secs(self.offset_secs)
    }
}
