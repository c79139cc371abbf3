//! DeliverySink trait - Dispatcher output interface
//!
//! Defines the abstract interface for Sinks.

use crate::{DeliveryOutcome, DeliveryTarget, Payload};

/// Payload delivery trait
///
/// All sink implementations must implement this trait. A sink is shared by
/// every concurrent delivery of a batch, so `deliver` takes `&self`.
#[trait_variant::make(DeliverySink: Send)]
pub trait LocalDeliverySink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver one payload to `target`
    ///
    /// Failures are reported through the outcome, never as a panic; retries
    /// (if any) happen inside this call.
    async fn deliver(&self, payload: &Payload, target: &DeliveryTarget) -> DeliveryOutcome;
}
