//! Dispatcher error types

use std::process::ExitStatus;

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// At least one payload of a batch could not be delivered
    #[error("{failed}/{total} payloads failed, last '{label}': {diagnostic}")]
    PartialBatch {
        failed: usize,
        total: usize,
        /// Label of the last failure collected
        label: String,
        diagnostic: String,
    },

    /// Error from contract
    #[error("contract error: {0}")]
    Contract(#[from] contracts::ContractError),
}

/// Failure of a single launch-to-exit attempt
///
/// Internal to the subprocess sink; folded into the outcome's diagnostic.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("failed to launch delivery program: {0}")]
    Launch(#[source] std::io::Error),

    #[error("failed to open {0} pipe")]
    Pipe(&'static str),

    #[error("failed to wait for delivery program: {0}")]
    Wait(#[source] std::io::Error),

    #[error("delivery program {status}")]
    Exit { status: ExitStatus, stderr: String },
}

impl AttemptError {
    /// Captured stderr (empty unless the program ran and exited)
    pub fn stderr(&self) -> &str {
        match self {
            Self::Exit { stderr, .. } => stderr,
            _ => "",
        }
    }

    /// `"<error>: <stderr>"`
    pub fn diagnostic(&self) -> String {
        format!("{self}: {}", self.stderr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_batch_message() {
        let err = DispatcherError::PartialBatch {
            failed: 2,
            total: 5,
            label: "profile_conf".into(),
            diagnostic: "delivery program exit status: 1: quota".into(),
        };
        assert_eq!(
            err.to_string(),
            "2/5 payloads failed, last 'profile_conf': delivery program exit status: 1: quota"
        );
    }

    #[test]
    fn test_launch_diagnostic_has_empty_stderr() {
        let err = AttemptError::Launch(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(err.diagnostic().starts_with("failed to launch delivery program"));
        assert!(err.diagnostic().ends_with(": "));
    }
}
