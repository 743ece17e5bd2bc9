//! systemd unit discovery and best-effort enablement.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::process::Cmd;
use crate::retry::{run_with_retry, RetryOutcome, RetryPolicy};
use crate::runner::CommandRunner;

/// Find the unit file for `unit` in any of `dirs`.
///
/// Looks one level deep as well, so `*.wants/` links count. Symlinks are
/// reported, not followed: a masked unit (link to /dev/null) still counts as
/// discoverable and `systemctl` reports the failure.
pub fn find_unit(dirs: &[PathBuf], unit: &str) -> Option<PathBuf> {
    dirs.iter().filter(|d| d.is_dir()).find_map(|dir| find_in(dir, unit))
}

fn find_in(dir: &Path, unit: &str) -> Option<PathBuf> {
    WalkDir::new(dir)
        .max_depth(2)
        .into_iter()
        .filter_map(Result::ok)
        .find(|entry| entry.file_name() == unit)
        .map(|entry| entry.into_path())
}

/// Result of [`enable_unit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnableOutcome {
    Enabled,
    /// No unit file found; nothing was run.
    NotFound,
    Failed { code: i32 },
}

/// `systemctl enable --now <unit>` if the unit is discoverable.
pub fn enable_unit<R>(runner: &mut R, dirs: &[PathBuf], unit: &str) -> EnableOutcome
where
    R: CommandRunner + ?Sized,
{
    if find_unit(dirs, unit).is_none() {
        return EnableOutcome::NotFound;
    }
    let cmd = Cmd::new("systemctl").args(["enable", "--now", unit]);
    match run_with_retry(runner, &cmd, RetryPolicy::ONCE) {
        RetryOutcome::Success { .. } => EnableOutcome::Enabled,
        RetryOutcome::Failed { code, .. } => EnableOutcome::Failed { code },
    }
}
