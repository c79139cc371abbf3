//! 快照目录数据源
//!
//! 外部渲染器把每个序列写成 `<dir>/<series>.csv`，这里只负责读取。

use std::path::{Path, PathBuf};

use bytes::Bytes;
use contracts::{ContractError, PayloadSource};
use tracing::{debug, instrument};

/// 从快照目录读取 CSV 的数据源
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    dir: PathBuf,
}

impl SnapshotSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 序列对应的文件路径
    pub fn path_for(&self, series: &str) -> PathBuf {
        self.dir.join(format!("{series}.csv"))
    }
}

impl PayloadSource for SnapshotSource {
    fn name(&self) -> &str {
        "snapshot"
    }

    #[instrument(name = "snapshot_render", skip(self), fields(dir = %self.dir.display()))]
    async fn render(&self, series: &str) -> Result<Bytes, ContractError> {
        let path = self.path_for(series);
        let body = tokio::fs::read(&path).await.map_err(|e| {
            ContractError::source_read(self.name(), series, format!("{}: {e}", path.display()))
        })?;

        if body.is_empty() {
            return Err(ContractError::source_read(
                self.name(),
                series,
                format!("{} is empty", path.display()),
            ));
        }

        debug!(series, bytes = body.len(), "Series rendered");
        Ok(Bytes::from(body))
    }
}
