//! Configuration management for hostprep.
//!
//! Reads configuration from a `.env` file and environment variables.
//! Environment variables take precedence over the `.env` file. Every key is
//! optional; defaults describe a stock Debian host.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::retry::RetryPolicy;

/// Fetched by the web admin panel step.
pub const DEFAULT_WEBMIN_URL: &str =
    "https://raw.githubusercontent.com/webmin/webmin/master/webmin-setup-repo.sh";

/// The colorized `ls` block of Debian's stock root profile.
pub const DEFAULT_BASHRC_LINES: (usize, usize) = (9, 13);

pub const DEFAULT_UNIT_DIRS: &str = "/etc/systemd/system:/lib/systemd/system:/usr/lib/systemd/system";

/// hostprep configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Name service switch config (default: /etc/nsswitch.conf)
    pub nsswitch: PathBuf,
    /// Root shell profile (default: /root/.bashrc)
    pub bashrc: PathBuf,
    /// 1-based inclusive line range uncommented in the shell profile
    pub bashrc_lines: (usize, usize),
    /// Samba config, patched for local-only NetBIOS resolution
    pub smb_conf: PathBuf,
    /// Directories searched for systemd unit files
    pub unit_dirs: Vec<PathBuf>,
    /// Installer script for the Webmin repository
    pub webmin_url: String,
    /// Pinned SHA-256 of the installer script (lowercase hex)
    pub webmin_sha256: Option<String>,
    /// Retry budget for package manager calls
    pub retry: RetryPolicy,
    /// Where to write the JSON run report, if anywhere
    pub report: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nsswitch: PathBuf::from("/etc/nsswitch.conf"),
            bashrc: PathBuf::from("/root/.bashrc"),
            bashrc_lines: DEFAULT_BASHRC_LINES,
            smb_conf: PathBuf::from("/etc/samba/smb.conf"),
            unit_dirs: split_dirs(DEFAULT_UNIT_DIRS),
            webmin_url: DEFAULT_WEBMIN_URL.to_string(),
            webmin_sha256: None,
            retry: RetryPolicy::DEFAULT,
            report: None,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// Call `dotenvy::dotenv()` first to pull a `.env` file into the
    /// environment; already-set variables are not overridden by it.
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let max_attempts = get("HOSTPREP_MAX_ATTEMPTS")
            .and_then(|v| parse_or_warn::<u32>("HOSTPREP_MAX_ATTEMPTS", &v))
            .filter(|n| *n > 0)
            .unwrap_or(defaults.retry.max_attempts);

        let delay = get("HOSTPREP_RETRY_DELAY_SECS")
            .and_then(|v| parse_or_warn::<u64>("HOSTPREP_RETRY_DELAY_SECS", &v))
            .map(Duration::from_secs)
            .unwrap_or(defaults.retry.delay);

        Self {
            nsswitch: get("HOSTPREP_NSSWITCH")
                .map(PathBuf::from)
                .unwrap_or(defaults.nsswitch),
            bashrc: get("HOSTPREP_BASHRC")
                .map(PathBuf::from)
                .unwrap_or(defaults.bashrc),
            bashrc_lines: get("HOSTPREP_BASHRC_LINES")
                .and_then(|v| parse_range(&v))
                .unwrap_or(defaults.bashrc_lines),
            smb_conf: get("HOSTPREP_SMB_CONF")
                .map(PathBuf::from)
                .unwrap_or(defaults.smb_conf),
            unit_dirs: get("HOSTPREP_UNIT_DIRS")
                .map(|v| split_dirs(&v))
                .unwrap_or(defaults.unit_dirs),
            webmin_url: get("HOSTPREP_WEBMIN_URL").unwrap_or(defaults.webmin_url),
            webmin_sha256: get("HOSTPREP_WEBMIN_SHA256").map(|v| v.to_ascii_lowercase()),
            retry: RetryPolicy::new(max_attempts, delay),
            report: get("HOSTPREP_REPORT").map(PathBuf::from),
        }
    }
}

fn split_dirs(value: &str) -> Vec<PathBuf> {
    value
        .split(':')
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Parse `START-END` (1-based, inclusive).
fn parse_range(value: &str) -> Option<(usize, usize)> {
    let parsed = value
        .split_once('-')
        .and_then(|(a, b)| {
            Some((
                a.trim().parse::<usize>().ok()?,
                b.trim().parse::<usize>().ok()?,
            ))
        })
        .filter(|&(start, end)| start > 0 && end >= start);
    if parsed.is_none() {
        warn!(key = "HOSTPREP_BASHRC_LINES", value, "ignoring invalid range, using default");
    }
    parsed
}

fn parse_or_warn<T: FromStr>(key: &str, value: &str) -> Option<T> {
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(key, value, "ignoring invalid value, using default");
            None
        }
    }
}
