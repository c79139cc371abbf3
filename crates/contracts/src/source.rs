//! PayloadSource trait - metrics collaborator abstraction
//!
//! The metrics themselves are opaque here: a source turns a series name into
//! rendered CSV bytes. Real deployments read what an external renderer
//! produced; tests use in-memory sources.

use bytes::Bytes;

use crate::ContractError;

/// Rendered-series provider
///
/// # Example
///
/// ```ignore
/// let csv = source.render("txrate").await?;
/// let payload = Payload::new("profile_txrate", csv);
/// ```
#[trait_variant::make(PayloadSource: Send)]
pub trait LocalPayloadSource {
    /// Source name (used for logging)
    fn name(&self) -> &str;

    /// Render the named series as CSV
    ///
    /// # Errors
    /// Returns `ContractError::SourceRead` when the series is unavailable
    async fn render(&self, series: &str) -> Result<Bytes, ContractError>;
}
