//! Timestamped backup copies.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use super::PatchError;

/// Copy `path` to `<path>.bak.<unix-seconds>` and return the backup path.
///
/// If a backup with that second already exists (two runs within one second),
/// a `.N` counter is appended so earlier backups are never overwritten.
/// `fs::copy` carries the permission bits over. Backups are never pruned.
pub fn backup_file(path: &Path) -> Result<PathBuf, PatchError> {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let base = format!("{}.bak.{}", path.display(), stamp);
    let mut backup = PathBuf::from(&base);
    let mut counter = 1u32;
    while backup.exists() {
        backup = PathBuf::from(format!("{}.{}", base, counter));
        counter += 1;
    }

    fs::copy(path, &backup).map_err(|e| PatchError::io("backing up", path, e))?;
    debug!(target_file = %path.display(), backup = %backup.display(), "backup written");
    Ok(backup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    #[test]
    fn test_backup_copies_content_and_mode() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("nsswitch.conf");
        fs::write(&target, "hosts: files dns\n").unwrap();
        fs::set_permissions(&target, fs::Permissions::from_mode(0o640)).unwrap();

        let backup = backup_file(&target).unwrap();

        assert_eq!(fs::read_to_string(&backup).unwrap(), "hosts: files dns\n");
        let mode = fs::metadata(&backup).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
        assert!(backup
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("nsswitch.conf.bak."));
    }

    #[test]
    fn test_repeated_backups_do_not_clobber() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join(".bashrc");
        fs::write(&target, "one\n").unwrap();
        let first = backup_file(&target).unwrap();

        fs::write(&target, "two\n").unwrap();
        let second = backup_file(&target).unwrap();

        assert_ne!(first, second);
        assert_eq!(fs::read_to_string(&first).unwrap(), "one\n");
        assert_eq!(fs::read_to_string(&second).unwrap(), "two\n");
    }

    #[test]
    fn test_backup_of_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let err = backup_file(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, PatchError::Io { .. }));
    }
}
