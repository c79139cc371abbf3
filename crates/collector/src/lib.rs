//! # Collector
//!
//! Metrics collaborator for the delivery pipeline.
//!
//! Responsibilities:
//! - Render metric series to CSV through a `PayloadSource`
//! - Produce the timestamp sheet that accompanies grouped sheet sets
//! - Assemble the `Payload` batch handed to the fan-out
//!
//! The CSV content is opaque here: a series is rendered to bytes and
//! forwarded untouched.
//!
//! ## Usage Example
//!
//! ```ignore
//! use collector::{collect_batch, SheetSet, SnapshotSource};
//!
//! let source = SnapshotSource::new("/var/lib/feesheets");
//! let set = SheetSet::prefixed("profile", &["conf", "txrate"]).with_timestamp("profile_time");
//! let payloads = collect_batch(&source, &set, chrono::Utc::now()).await?;
//! ```

mod batch;
mod mock;
mod snapshot;
mod timestamp;

pub use batch::{SheetBinding, SheetSet, collect_batch};
pub use mock::StaticSource;
pub use snapshot::SnapshotSource;
pub use timestamp::{TIMESTAMP_HEADER, timestamp_csv};
