//! Shared test utilities for hostprep tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use hostprep::config::Config;
use hostprep::retry::RetryPolicy;
use tempfile::TempDir;

/// A fake host root: config files and systemd unit directories under a temp dir.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    pub root: PathBuf,
    pub nsswitch: PathBuf,
    pub bashrc: PathBuf,
    pub smb_conf: PathBuf,
    pub unit_dir: PathBuf,
}

impl TestEnv {
    /// Create an environment with a stock nsswitch.conf and no other files.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().to_path_buf();

        let nsswitch = root.join("etc/nsswitch.conf");
        let bashrc = root.join("root/.bashrc");
        let smb_conf = root.join("etc/samba/smb.conf");
        let unit_dir = root.join("lib/systemd/system");

        fs::create_dir_all(root.join("etc/samba")).expect("Failed to create etc");
        fs::create_dir_all(root.join("root")).expect("Failed to create root home");
        fs::create_dir_all(&unit_dir).expect("Failed to create unit dir");
        fs::write(
            &nsswitch,
            "passwd:         files\ngroup:          files\nhosts:          files dns\nnetworks:       files\n",
        )
        .expect("Failed to write nsswitch.conf");

        Self {
            _temp_dir: temp_dir,
            root,
            nsswitch,
            bashrc,
            smb_conf,
            unit_dir,
        }
    }

    /// Configuration pointing at this environment, with instant retries.
    pub fn config(&self) -> Config {
        Config {
            nsswitch: self.nsswitch.clone(),
            bashrc: self.bashrc.clone(),
            smb_conf: self.smb_conf.clone(),
            unit_dirs: vec![self.unit_dir.clone()],
            retry: RetryPolicy::new(3, Duration::ZERO),
            ..Config::default()
        }
    }

    /// Make `units` discoverable.
    pub fn with_units(self, units: &[&str]) -> Self {
        for unit in units {
            fs::write(self.unit_dir.join(unit), "[Unit]\n").expect("Failed to write unit");
        }
        self
    }

    pub fn read(&self, path: &Path) -> String {
        fs::read_to_string(path).expect("Failed to read file")
    }

    /// Backup files created next to `path`.
    pub fn backups_of(&self, path: &Path) -> Vec<PathBuf> {
        let prefix = format!(
            "{}.bak.",
            path.file_name().unwrap().to_string_lossy()
        );
        let mut found: Vec<PathBuf> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.file_name().unwrap().to_string_lossy().starts_with(&prefix))
            .collect();
        found.sort();
        found
    }
}

/// `-o <dest>` target of a curl command line.
pub fn curl_dest(args: &[String]) -> PathBuf {
    let at = args.iter().position(|a| a == "-o").expect("curl without -o");
    PathBuf::from(&args[at + 1])
}
