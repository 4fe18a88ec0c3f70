use std::fmt;
use std::path::PathBuf;

use crate::error::PunchError;

/// Non-fatal problems met while updating files.
///
/// The offending file is skipped and the run continues; warnings are reported
/// together at the end.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateWarning {
    /// A serializer's current rendering does not occur in the file
    PatternMismatch { path: PathBuf, pattern: String },
    /// The file could not be read or written
    FileError { path: PathBuf, reason: String },
}

impl UpdateWarning {
    /// Turns a per-file update error into a warning for `path`.
    pub fn from_error(path: impl Into<PathBuf>, err: &PunchError) -> Self {
        match err {
            PunchError::PatternMismatch { path, pattern } => UpdateWarning::PatternMismatch {
                path: path.clone(),
                pattern: pattern.clone(),
            },
            other => UpdateWarning::FileError {
                path: path.into(),
                reason: other.to_string(),
            },
        }
    }

    pub fn path(&self) -> &PathBuf {
        match self {
            UpdateWarning::PatternMismatch { path, .. } | UpdateWarning::FileError { path, .. } => {
                path
            }
        }
    }
}

impl fmt::Display for UpdateWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateWarning::PatternMismatch { path, pattern } => {
                write!(
                    f,
                    "Cannot find '{}' in {}, file left unchanged",
                    pattern,
                    path.display()
                )
            }
            UpdateWarning::FileError { path, reason } => {
                write!(f, "Cannot update {}: {}", path.display(), reason)
            }
        }
    }
}
