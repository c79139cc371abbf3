//! FanOut - concurrent delivery of one batch to a sink
//!
//! Every payload gets its own task in a `JoinSet`; all of them run to
//! completion regardless of earlier failures, and the set is drained before
//! `deliver_all` returns. Dropping the future aborts whatever is still
//! running (child processes go with it via `kill_on_drop`).

use std::sync::Arc;

use contracts::{DeliverySink, DeliveryTarget, Payload};
use tokio::task::JoinSet;
use tracing::{debug, error, instrument};

use crate::error::DispatcherError;

/// Label used when a delivery task panicked or was cancelled
const UNKNOWN_LABEL: &str = "unknown";

/// Fan-out of payload batches onto a shared sink and target
pub struct FanOut<S> {
    sink: Arc<S>,
    target: Arc<DeliveryTarget>,
}

impl<S> Clone for FanOut<S> {
    fn clone(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            target: Arc::clone(&self.target),
        }
    }
}

impl<S> FanOut<S>
where
    S: DeliverySink + Sync + 'static,
{
    pub fn new(sink: Arc<S>, target: Arc<DeliveryTarget>) -> Self {
        Self { sink, target }
    }

    pub fn sink(&self) -> &Arc<S> {
        &self.sink
    }

    pub fn target(&self) -> &DeliveryTarget {
        &self.target
    }

    /// Deliver every payload concurrently and aggregate failures
    ///
    /// Returns `PartialBatch` if any payload failed; `label` and `diagnostic`
    /// describe the last failure collected.
    #[instrument(
        name = "fanout_deliver_all",
        skip(self, payloads),
        fields(sink = %self.sink.name(), payloads = payloads.len())
    )]
    pub async fn deliver_all(&self, payloads: Vec<Payload>) -> Result<(), DispatcherError> {
        let total = payloads.len();
        if total == 0 {
            debug!("Empty batch, nothing to deliver");
            return Ok(());
        }

        let mut tasks = JoinSet::new();
        for payload in payloads {
            let sink = Arc::clone(&self.sink);
            let target = Arc::clone(&self.target);
            tasks.spawn(async move {
                let outcome = sink.deliver(&payload, &target).await;
                (payload.label, outcome)
            });
        }

        let mut failed = 0;
        let mut last_failure: Option<(String, String)> = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, outcome)) if outcome.succeeded => {}
                Ok((label, outcome)) => {
                    failed += 1;
                    error!(
                        label = %label,
                        attempts = outcome.attempts,
                        diagnostic = outcome.diagnostic(),
                        "Payload delivery failed"
                    );
                    last_failure = Some((label, outcome.diagnostic().to_string()));
                }
                Err(e) => {
                    failed += 1;
                    error!(error = %e, "Delivery task did not complete");
                    last_failure = Some((UNKNOWN_LABEL.to_string(), e.to_string()));
                }
            }
        }

        observability::record_batch(total, failed);

        match last_failure {
            None => {
                debug!(total, "Batch delivered");
                Ok(())
            }
            Some((label, diagnostic)) => Err(DispatcherError::PartialBatch {
                failed,
                total,
                label,
                diagnostic,
            }),
        }
    }
}
