//! Scheduler 错误类型

use thiserror::Error;

/// Scheduler 错误
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// 同名任务已在运行
    #[error("job '{name}' is already scheduled")]
    DuplicateJob { name: String },

    /// 任务规格不合法
    #[error("invalid schedule for job '{name}': {reason}")]
    InvalidSpec { name: String, reason: String },

    /// 已开始关闭，不再接受新任务
    #[error("scheduler is shutting down")]
    ShuttingDown,
}
