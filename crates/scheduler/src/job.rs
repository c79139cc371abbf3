//! 可调度任务

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use contracts::JobSpec;

/// 一次任务执行
pub type TaskFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

/// 每个 tick 调用一次，生成新的执行
pub type Task = Arc<dyn Fn() -> TaskFuture + Send + Sync>;

/// 由闭包构造 `Task`
pub fn task<F, Fut>(f: F) -> Task
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move || Box::pin(f()) as TaskFuture)
}

/// 任务规格与其执行体
#[derive(Clone)]
pub struct ScheduledJob {
    pub spec: JobSpec,
    pub task: Task,
}

impl ScheduledJob {
    pub fn new(spec: JobSpec, task: Task) -> Self {
        Self { spec, task }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// 立即执行一次 (不经过调度)
    pub async fn run_once(&self) -> anyhow::Result<()> {
        (self.task)().await
    }
}

impl std::fmt::Debug for ScheduledJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledJob")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}
