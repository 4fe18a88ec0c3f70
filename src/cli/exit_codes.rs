//! Process exit codes

use crate::error::PunchError;

pub const ERROR: i32 = 1;
pub const CONFIG_ERROR: i32 = 2;
pub const VALIDATION_ERROR: i32 = 3;
pub const PARSE_ERROR: i32 = 4;
pub const REPOSITORY_ERROR: i32 = 5;

/// Exit code reported for a fatal error.
pub fn for_error(err: &PunchError) -> i32 {
    match err {
        PunchError::Configuration(_) => CONFIG_ERROR,
        PunchError::Validation(_) => VALIDATION_ERROR,
        PunchError::Parse(_) => PARSE_ERROR,
        PunchError::Repository(_) | PunchError::Git(_) | PunchError::Workflow(_) => {
            REPOSITORY_ERROR
        }
        PunchError::PatternMismatch { .. } | PunchError::Io(_) => ERROR,
    }
}
