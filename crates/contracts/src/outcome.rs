//! DeliveryOutcome - per-payload delivery result

/// Result of delivering one payload.
///
/// Never retained beyond aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    /// Whether any attempt succeeded
    pub succeeded: bool,

    /// Last error plus captured stderr, present on failure only
    pub diagnostic: Option<String>,

    /// Attempts made (1-based count)
    pub attempts: u32,
}

impl DeliveryOutcome {
    /// Successful delivery after `attempts` tries
    pub fn delivered(attempts: u32) -> Self {
        Self {
            succeeded: true,
            diagnostic: None,
            attempts,
        }
    }

    /// Failed delivery after `attempts` tries
    pub fn failed(diagnostic: impl Into<String>, attempts: u32) -> Self {
        Self {
            succeeded: false,
            diagnostic: Some(diagnostic.into()),
            attempts,
        }
    }

    /// Diagnostic text or an empty string
    pub fn diagnostic(&self) -> &str {
        self.diagnostic.as_deref().unwrap_or_default()
    }
}
