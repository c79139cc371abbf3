//! Payload - unit of delivery
//!
//! A rendered CSV buffer bound to the worksheet it must land in.

use bytes::Bytes;

/// Opaque content destined for one worksheet.
///
/// Immutable once produced. `body` is reference counted so handing a payload
/// to a writer task never copies the CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    /// Identifies the payload in aggregate errors (defaults to the destination)
    pub label: String,

    /// Worksheet name inside the target spreadsheet
    pub destination: String,

    /// Raw CSV bytes
    pub body: Bytes,
}

impl Payload {
    /// Create a payload labelled after its destination worksheet
    pub fn new(destination: impl Into<String>, body: impl Into<Bytes>) -> Self {
        let destination = destination.into();
        Self {
            label: destination.clone(),
            destination,
            body: body.into(),
        }
    }

    /// Override the label used in diagnostics
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Body size in bytes
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Whether the body is empty
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}
