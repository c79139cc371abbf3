//! LogSink - logs payload summary via tracing
//!
//! Used for dry runs: nothing is spawned, every delivery succeeds.

use contracts::{DeliveryOutcome, DeliverySink, DeliveryTarget, Payload};
use tracing::{info, instrument};

/// Sink that logs payload summaries instead of delivering them
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl DeliverySink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_deliver",
        skip(self, payload, target),
        fields(sink = %self.name, worksheet = %payload.destination)
    )]
    async fn deliver(&self, payload: &Payload, target: &DeliveryTarget) -> DeliveryOutcome {
        info!(
            sink = %self.name,
            spreadsheet = %target.spreadsheet_id,
            worksheet = %payload.destination,
            bytes = payload.len(),
            lines = payload.body.iter().filter(|b| **b == b'\n').count(),
            "Payload received (dry run)"
        );
        DeliveryOutcome::delivered(1)
    }
}
