//! Error types for the platform client

use mlp_core::domain::job::SpecError;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when using the platform client
///
/// Every variant that originates in the orchestration API carries the
/// collaborator's diagnostic text unchanged.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The job spec failed validation before submission
    #[error("Invalid job spec: {0}")]
    InvalidSpec(#[from] SpecError),

    /// The client configuration is incomplete or inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The manifest was rejected or the apply operation failed
    #[error("Failed to submit job: {message}")]
    Submission {
        /// Diagnostic text from the orchestration API
        message: String,
    },

    /// The completion condition was not observed in time
    #[error("Timed out after {timeout_secs}s waiting for job {namespace}/{name}")]
    WaitTimeout {
        name: String,
        namespace: String,
        timeout_secs: u64,
    },

    /// The addressed resource does not exist
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// An orchestration API command exited non-zero
    #[error("Command `{command}` failed: {message}")]
    CommandFailed {
        /// The command line, for operator triage
        command: String,
        /// Diagnostic text from the command
        message: String,
    },

    /// Output from the orchestration API could not be interpreted
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Spawning or talking to the external process failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    pub fn command_failed(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this error is a wait timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::WaitTimeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_error_keeps_diagnostic() {
        let err = ClientError::Submission {
            message: "error: namespaces \"jobs\" not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to submit job: error: namespaces \"jobs\" not found"
        );
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_predicates() {
        assert!(ClientError::NotFound("job".into()).is_not_found());
        let timeout = ClientError::WaitTimeout {
            name: "a".into(),
            namespace: "jobs".into(),
            timeout_secs: 0,
        };
        assert!(timeout.is_timeout());
        assert_eq!(timeout.to_string(), "Timed out after 0s waiting for job jobs/a");
    }

    #[test]
    fn test_spec_error_conversion() {
        let err: ClientError = SpecError::EmptyImage.into();
        assert!(matches!(err, ClientError::InvalidSpec(SpecError::EmptyImage)));
    }
}
