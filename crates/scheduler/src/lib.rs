//! # Scheduler
//!
//! 相位对齐的周期调度器。
//!
//! 负责：
//! - 将每个任务的首次执行对齐到墙钟周期边界 (加偏移)
//! - 以固定周期重复执行，任务出错只记录不中断
//! - 优雅关闭：不再启动新的执行，正在执行的任务跑完

mod align;
mod clock;
mod error;
mod job;
mod scheduler;

pub use align::initial_delay;
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::SchedulerError;
pub use job::{ScheduledJob, Task, TaskFuture, task};
pub use scheduler::{JobSummary, PeriodicScheduler};
