//! # Contracts
//!
//! Frozen interface contracts, defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Data Model
//! - `Payload`: opaque CSV bytes plus the worksheet they belong to
//! - `DeliveryTarget`: external program + spreadsheet + credential reference
//! - `DeliveryOutcome`: result of delivering one payload
//! - `SheetsBlueprint`: configuration root (jobs, source, delivery policy)

mod blueprint;
mod error;
mod outcome;
mod payload;
mod sink;
mod source;
mod target;

pub use blueprint::*;
pub use error::*;
pub use outcome::DeliveryOutcome;
pub use payload::Payload;
pub use sink::*;
pub use source::*;
pub use target::{DeliveryPolicy, DeliveryTarget};
