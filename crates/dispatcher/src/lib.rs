//! # Dispatcher
//!
//! 投递模块。
//!
//! 负责：
//! - 通过外部程序投递单个 `Payload`，带有限重试与信号升级
//! - Fan-out 一个批次到同一个 sink，汇总部分失败
//! - 记录 sink 级别计数

pub mod error;
pub mod fanout;
pub mod metrics;
pub mod sinks;

pub use contracts::{DeliveryOutcome, DeliverySink, DeliveryTarget, Payload};
pub use error::{AttemptError, DispatcherError};
pub use fanout::FanOut;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{ConfiguredSink, LogSink, SubprocessSink};
