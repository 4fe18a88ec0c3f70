use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for punch operations
#[derive(Error, Debug)]
pub enum PunchError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Version file error: {0}")]
    Parse(String),

    #[error("Cannot find '{pattern}' in {}", path.display())]
    PatternMismatch { path: PathBuf, pattern: String },

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Release workflow error: {0}")]
    Workflow(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in punch
pub type Result<T> = std::result::Result<T, PunchError>;

impl PunchError {
    /// Create a configuration error with context
    pub fn configuration(msg: impl Into<String>) -> Self {
        PunchError::Configuration(msg.into())
    }

    /// Create a validation error with context
    pub fn validation(msg: impl Into<String>) -> Self {
        PunchError::Validation(msg.into())
    }

    /// Create a version file parse error with context
    pub fn parse(msg: impl Into<String>) -> Self {
        PunchError::Parse(msg.into())
    }

    /// Create a repository error with context
    pub fn repository(msg: impl Into<String>) -> Self {
        PunchError::Repository(msg.into())
    }

    pub fn workflow(msg: impl Into<String>) -> Self {
        PunchError::Workflow(msg.into())
    }

    /// Whether the run may continue after this error.
    ///
    /// Only a pattern missing from a target file is recoverable; the caller
    /// turns it into a warning and moves on to the next file.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PunchError::PatternMismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PunchError::configuration("unknown action 'build'");
        assert_eq!(
            err.to_string(),
            "Configuration error: unknown action 'build'"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PunchError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_pattern_mismatch_display() {
        let err = PunchError::PatternMismatch {
            path: PathBuf::from("README.md"),
            pattern: "1.2.3".to_string(),
        };
        assert_eq!(err.to_string(), "Cannot find '1.2.3' in README.md");
    }

    #[test]
    fn test_only_pattern_mismatch_is_recoverable() {
        let mismatch = PunchError::PatternMismatch {
            path: PathBuf::from("setup.py"),
            pattern: "v1".to_string(),
        };
        assert!(mismatch.is_recoverable());

        let fatal = vec![
            PunchError::configuration("x"),
            PunchError::validation("x"),
            PunchError::parse("x"),
            PunchError::repository("x"),
            PunchError::workflow("x"),
        ];
        for err in fatal {
            assert!(!err.is_recoverable(), "{} should be fatal", err);
        }
    }

    #[test]
    fn test_error_messages_are_descriptive() {
        let error_pairs = vec![
            (PunchError::configuration("x"), "Configuration error"),
            (PunchError::validation("x"), "Validation error"),
            (PunchError::parse("x"), "Version file error"),
            (PunchError::repository("x"), "Repository error"),
            (PunchError::workflow("x"), "Release workflow error"),
        ];

        for (err, expected_prefix) in error_pairs {
            let msg = err.to_string();
            assert!(
                msg.starts_with(expected_prefix),
                "Error message should start with '{}', but got '{}'",
                expected_prefix,
                msg
            );
        }
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Table>("major = = 1").unwrap_err();
        let err: PunchError = toml_err.into();
        assert!(err.to_string().starts_with("Invalid TOML"));
    }
}
