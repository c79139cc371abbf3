//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Job name with no registered sheet set
    #[error("unknown job '{name}' (known jobs: {known})")]
    UnknownJob { name: String, known: String },

    /// Job requested on the command line but absent from the configuration
    #[error("job '{name}' is not configured (configured jobs: {configured})")]
    NotConfigured { name: String, configured: String },

    /// One-shot run finished with failures
    #[error("{failed} of {total} job(s) failed")]
    JobsFailed { failed: usize, total: usize },
}

impl CliError {
    pub fn unknown_job(name: impl Into<String>, known: &[&str]) -> Self {
        Self::UnknownJob {
            name: name.into(),
            known: known.join(", "),
        }
    }
}
