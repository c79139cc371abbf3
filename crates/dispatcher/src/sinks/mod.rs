//! Sink implementations
//!
//! Contains SubprocessSink and LogSink, plus `ConfiguredSink` which picks one
//! of them at startup.

mod log;
mod subprocess;

pub use self::log::LogSink;
pub use self::subprocess::SubprocessSink;

use std::sync::Arc;

use contracts::{DeliveryOutcome, DeliveryPolicy, DeliverySink, DeliveryTarget, Payload};

use crate::metrics::SinkMetrics;

/// Sink selected from command-line options
pub enum ConfiguredSink {
    Subprocess(SubprocessSink),
    Log(LogSink),
}

impl ConfiguredSink {
    /// `LogSink` for dry runs, otherwise `SubprocessSink` with `policy`
    pub fn new(dry_run: bool, policy: DeliveryPolicy) -> Self {
        if dry_run {
            Self::Log(LogSink::new("dry_run"))
        } else {
            Self::Subprocess(SubprocessSink::new("subprocess", policy))
        }
    }

    /// Counters of the subprocess sink (None for dry runs)
    pub fn metrics(&self) -> Option<Arc<SinkMetrics>> {
        match self {
            Self::Subprocess(sink) => Some(sink.metrics()),
            Self::Log(_) => None,
        }
    }
}

impl DeliverySink for ConfiguredSink {
    fn name(&self) -> &str {
        match self {
            Self::Subprocess(sink) => sink.name(),
            Self::Log(sink) => sink.name(),
        }
    }

    async fn deliver(&self, payload: &Payload, target: &DeliveryTarget) -> DeliveryOutcome {
        match self {
            Self::Subprocess(sink) => sink.deliver(payload, target).await,
            Self::Log(sink) => sink.deliver(payload, target).await,
        }
    }
}
