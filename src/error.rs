//! Errors that stop a run before or outside the step pipeline.
//!
//! Failures inside the pipeline are [`StepError`](crate::steps::StepError)s
//! and are classified per step; see [`pipeline`](crate::pipeline).

use thiserror::Error;

/// Exit code when not running as root.
pub const EXIT_PRIVILEGE: i32 = 1;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("hostprep must be run as root (try sudo, or --dry-run)")]
    Privilege,

    #[error(transparent)]
    Arguments(#[from] clap::Error),
}

impl RunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Privilege => EXIT_PRIVILEGE,
            RunError::Arguments(err) => err.exit_code(),
        }
    }
}
