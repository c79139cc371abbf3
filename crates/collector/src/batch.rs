//! 批次构建
//!
//! 一个 `SheetSet` 描述一次投递周期要写的全部工作表。所有序列先渲染完成，
//! 任意一个失败则整个批次失败，不会投递任何内容。

use bytes::Bytes;
use chrono::{DateTime, Utc};
use contracts::{ContractError, Payload, PayloadSource};
use tracing::{debug, instrument};

use crate::timestamp::timestamp_csv;

/// 序列到工作表的绑定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetBinding {
    pub series: String,
    pub worksheet: String,
}

impl SheetBinding {
    pub fn new(series: impl Into<String>, worksheet: impl Into<String>) -> Self {
        Self {
            series: series.into(),
            worksheet: worksheet.into(),
        }
    }
}

/// 一次投递周期的工作表集合
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetSet {
    pub bindings: Vec<SheetBinding>,
    /// 附加的时间戳工作表
    pub timestamp_sheet: Option<String>,
}

impl SheetSet {
    /// 单个序列写到单个工作表
    pub fn single(series: impl Into<String>, worksheet: impl Into<String>) -> Self {
        Self {
            bindings: vec![SheetBinding::new(series, worksheet)],
            timestamp_sheet: None,
        }
    }

    /// 每个序列写到 `<prefix>_<series>`
    pub fn prefixed(prefix: &str, series: &[&str]) -> Self {
        Self {
            bindings: series
                .iter()
                .map(|s| SheetBinding::new(*s, format!("{prefix}_{s}")))
                .collect(),
            timestamp_sheet: None,
        }
    }

    pub fn with_timestamp(mut self, worksheet: impl Into<String>) -> Self {
        self.timestamp_sheet = Some(worksheet.into());
        self
    }

    /// 批次中的工作表数量 (含时间戳工作表)
    pub fn len(&self) -> usize {
        self.bindings.len() + usize::from(self.timestamp_sheet.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 全部目标工作表名
    pub fn worksheets(&self) -> impl Iterator<Item = &str> {
        self.bindings
            .iter()
            .map(|b| b.worksheet.as_str())
            .chain(self.timestamp_sheet.as_deref())
    }
}

/// 渲染一个 SheetSet 为 Payload 批次
///
/// 按绑定顺序渲染，时间戳工作表放在最后。
#[instrument(name = "collect_batch", skip(source, set), fields(source = source.name(), sheets = set.len()))]
pub async fn collect_batch<S: PayloadSource + Sync>(
    source: &S,
    set: &SheetSet,
    now: DateTime<Utc>,
) -> Result<Vec<Payload>, ContractError> {
    let mut payloads = Vec::with_capacity(set.len());

    for binding in &set.bindings {
        let body: Bytes = source.render(&binding.series).await?;
        payloads.push(Payload::new(binding.worksheet.clone(), body));
    }

    if let Some(sheet) = &set.timestamp_sheet {
        payloads.push(Payload::new(sheet.clone(), timestamp_csv(now)));
    }

    debug!(payloads = payloads.len(), "Batch collected");
    Ok(payloads)
}
