//! DeliveryTarget / DeliveryPolicy
//!
//! Where payloads go and how hard a delivery is allowed to try.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// External program plus the identifiers it is invoked with.
///
/// Built once per process and shared read-only by every delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryTarget {
    /// Path to the delivery executable
    pub program: PathBuf,

    /// Spreadsheet identifier (first positional argument)
    pub spreadsheet_id: String,

    /// Credential reference (third positional argument)
    pub auth_ref: PathBuf,
}

impl DeliveryTarget {
    pub fn new(
        program: impl Into<PathBuf>,
        spreadsheet_id: impl Into<String>,
        auth_ref: impl Into<PathBuf>,
    ) -> Self {
        Self {
            program: program.into(),
            spreadsheet_id: spreadsheet_id.into(),
            auth_ref: auth_ref.into(),
        }
    }
}

/// Retry bound and escalation windows for one delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryPolicy {
    /// Launch-through-wait attempts before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Time after launch before SIGINT is sent (seconds in config)
    #[serde(
        default = "default_interrupt_after",
        rename = "interrupt_after_secs",
        with = "secs_f64"
    )]
    interrupt_after: Duration,

    /// Time after launch before SIGKILL is sent (seconds in config)
    #[serde(
        default = "default_kill_after",
        rename = "kill_after_secs",
        with = "secs_f64"
    )]
    kill_after: Duration,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_interrupt_after() -> Duration {
    Duration::from_secs(120)
}

fn default_kill_after() -> Duration {
    Duration::from_secs(180)
}

mod secs_f64 {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            interrupt_after: default_interrupt_after(),
            kill_after: default_kill_after(),
        }
    }
}

impl DeliveryPolicy {
    /// Build a policy with explicit windows
    pub fn new(max_attempts: u32, interrupt_after: Duration, kill_after: Duration) -> Self {
        Self {
            max_attempts,
            interrupt_after,
            kill_after,
        }
    }

    /// Soft window: graceful interrupt after this much time
    pub fn interrupt_after(&self) -> Duration {
        self.interrupt_after
    }

    /// Hard window: forceful kill after this much time
    pub fn kill_after(&self) -> Duration {
        self.kill_after
    }
}
