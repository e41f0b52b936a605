//! Error types for clipshift
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in the execution core
#[derive(Debug, Error)]
pub enum ClipshiftError {
    /// A loop was started while it was already running
    #[error("Can't start the thread loop twice")]
    AlreadyRunning,

    /// A job or call was rejected before any work started
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Every attempt of a retrying job failed with a retryable error
    #[error(
        "Gave up after {attempts} attempts; distinct failures seen: {}",
        .failures.join("; ")
    )]
    RetriesExhausted { attempts: u32, failures: Vec<String> },

    /// The key sender failed to inject an operation batch
    #[error("Key send error: {0}")]
    KeySend(String),

    /// Installing or uninstalling the hotkey hook failed
    #[error("Hook error: {0}")]
    Hook(String),

    /// Failure raised by a job action
    #[error("Job error: {0}")]
    Job(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ClipshiftError {
    /// Distinct failure messages carried by an aggregate error
    pub fn failures(&self) -> &[String] {
        match self {
            Self::RetriesExhausted { failures, .. } => failures,
            _ => &[],
        }
    }
}

/// Result type alias for clipshift operations
pub type Result<T> = std::result::Result<T, ClipshiftError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_running_error() {
        let err = ClipshiftError::AlreadyRunning;
        assert_eq!(err.to_string(), "Can't start the thread loop twice");
    }

    #[test]
    fn test_invalid_argument_error() {
        let err = ClipshiftError::InvalidArgument("attempts_before_failing must be > 0".to_string());
        assert_eq!(err.to_string(), "Invalid argument: attempts_before_failing must be > 0");
    }

    #[test]
    fn test_retries_exhausted_lists_failures() {
        let err = ClipshiftError::RetriesExhausted {
            attempts: 3,
            failures: vec!["busy".to_string(), "locked".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Gave up after 3 attempts; distinct failures seen: busy; locked"
        );
        assert_eq!(err.failures().len(), 2);
    }

    #[test]
    fn test_failures_empty_for_other_variants() {
        let err = ClipshiftError::KeySend("SendInput returned 0".to_string());
        assert!(err.failures().is_empty());
        assert_eq!(err.to_string(), "Key send error: SendInput returned 0");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ClipshiftError = io_err.into();
        assert!(matches!(err, ClipshiftError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_err = serde_yaml::from_str::<u32>("[not, a, number]").unwrap_err();
        let err: ClipshiftError = yaml_err.into();
        assert!(matches!(err, ClipshiftError::Yaml(_)));
    }
}
