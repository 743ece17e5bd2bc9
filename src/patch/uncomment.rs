//! Positional uncommenting of a fixed line range.
//!
//! This is content-blind: lines `start..=end` (1-based) lose one leading `#`
//! plus any spaces or tabs right after it. Lines in the range that are not
//! comments are left as they are, and lines outside the range are never
//! touched. A file shorter than the range is patched as far as it goes.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::rule::read_or_create;
use super::{backup_file, split_lines, split_terminator, MissingFile, PatchError, PatchMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UncommentOutcome {
    /// 1-based numbers of the lines that were uncommented.
    pub uncommented: Vec<usize>,
    /// Lines of the range that lie past end of file.
    pub missing: usize,
    pub backup: Option<PathBuf>,
    pub created: bool,
}

impl UncommentOutcome {
    pub fn changed(&self) -> bool {
        self.created || !self.uncommented.is_empty()
    }

    /// Every line of the range exists and none needed changing.
    pub fn already_applied(&self) -> bool {
        self.uncommented.is_empty() && self.missing == 0
    }
}

/// Strip one leading `#` and the whitespace after it, if the line starts with `#`.
fn uncomment_line(body: &str) -> Option<&str> {
    body.strip_prefix('#')
        .map(|rest| rest.trim_start_matches([' ', '\t']))
}

/// Uncomment lines `start..=end` of `path`.
pub fn uncomment_range(
    path: &Path,
    start: usize,
    end: usize,
    missing_file: &MissingFile,
    mode: PatchMode,
) -> Result<UncommentOutcome, PatchError> {
    if start == 0 || end < start {
        return Err(PatchError::InvalidRange { start, end });
    }

    let (content, created) = read_or_create(path, missing_file, mode)?;
    let backup = match mode {
        PatchMode::Write => Some(backup_file(path)?),
        PatchMode::DryRun => None,
    };

    let lines = split_lines(&content);
    let mut uncommented = Vec::new();
    let mut updated = String::with_capacity(content.len());

    for (index, line) in lines.iter().enumerate() {
        let number = index + 1;
        let (body, terminator) = split_terminator(line);
        match uncomment_line(body) {
            Some(stripped) if (start..=end).contains(&number) => {
                updated.push_str(stripped);
                updated.push_str(terminator);
                uncommented.push(number);
            }
            _ => updated.push_str(line),
        }
    }

    let missing = (start..=end).filter(|n| *n > lines.len()).count();
    if missing > 0 {
        warn!(
            file = %path.display(),
            lines = lines.len(),
            start,
            end,
            "file is shorter than the expected range"
        );
    }

    if uncommented.is_empty() {
        info!(file = %path.display(), start, end, "nothing to uncomment");
    } else {
        if mode == PatchMode::Write {
            fs::write(path, &updated).map_err(|e| PatchError::io("writing", path, e))?;
        }
        info!(file = %path.display(), lines = ?uncommented, "uncommented");
    }

    Ok(UncommentOutcome {
        uncommented,
        missing,
        backup,
        created,
    })
}
