//! Idempotent, line-oriented edits of host configuration files.
//!
//! Every mutating call backs the target up first (see [`backup`]). Content
//! outside the edited line is preserved byte-for-byte, line endings included.
//!
//! - [`rule`] - content-addressed rules: find a line, check it, transform it
//! - [`uncomment`] - positional variant that strips `#` from a line range

pub mod backup;
pub mod rule;
pub mod uncomment;

use std::path::PathBuf;

use thiserror::Error;

pub use backup::backup_file;
pub use rule::{apply, has_token, Change, MissingLine, PatchOutcome, PatchRule};
pub use uncomment::{uncomment_range, UncommentOutcome};

/// Whether a patch call is allowed to touch the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatchMode {
    #[default]
    Write,
    /// Compute the outcome only: no backup, no write, no file creation.
    DryRun,
}

/// What to do when the target file does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingFile {
    /// The file is required; report [`PatchError::MissingTarget`].
    Fail,
    /// Write this default content first, then patch it.
    Create(String),
}

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("{} does not exist", .0.display())]
    MissingTarget(PathBuf),

    #[error("{action} {}: {source}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("invalid line range {start}..={end} (lines are 1-based)")]
    InvalidRange { start: usize, end: usize },
}

impl PatchError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PatchError::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

/// Split `content` into lines, each keeping its own terminator.
pub(crate) fn split_lines(content: &str) -> Vec<&str> {
    content.split_inclusive('\n').collect()
}

/// Split a line into its body and its terminator (`\n`, `\r\n` or empty).
pub(crate) fn split_terminator(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}
