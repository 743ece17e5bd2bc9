//! Fetch-verify-execute for a remote installer script.
//!
//! The script is downloaded over HTTPS with curl into a temporary file,
//! checked to be a script rather than an HTML error page (and optionally
//! against a pinned SHA-256), executed with `sh`, and removed again when the
//! temporary file is dropped.

use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{info, warn};

use crate::process::Cmd;
use crate::retry::{run_with_retry, RetryOutcome, RetryPolicy};
use crate::runner::CommandRunner;

/// How much of the payload is inspected for HTML markers.
const SNIFF_BYTES: usize = 1024;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("download of {url} failed (exit code {code})")]
    Transfer { url: String, code: i32 },

    #[error("downloaded content from {url} is empty")]
    Empty { url: String },

    #[error("downloaded content from {url} is an HTML page, not a script")]
    HtmlPayload { url: String },

    #[error("checksum mismatch for {url}\n  Expected: {expected}\n  Got: {actual}")]
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("installer script exited with code {code}")]
    Installer { code: i32 },

    #[error("temporary file: {0}")]
    Io(#[from] std::io::Error),
}

/// True if the start of `content` looks like an HTML document.
pub fn looks_like_html(content: &[u8]) -> bool {
    let head = &content[..content.len().min(SNIFF_BYTES)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();
    head.contains("<html") || head.contains("<!doctype html")
}

/// Lowercase hex SHA-256 of `content`.
pub fn sha256_hex(content: &[u8]) -> String {
    format!("{:x}", Sha256::digest(content))
}

/// A remote script with an optional pinned checksum.
#[derive(Debug, Clone)]
pub struct RemoteScript<'a> {
    pub url: &'a str,
    pub sha256: Option<&'a str>,
}

impl RemoteScript<'_> {
    fn curl(&self, dest: &Path) -> Cmd {
        Cmd::new("curl")
            .args(["-fsSL", "--proto", "=https", "--tlsv1.2", "-o"])
            .arg_path(dest)
            .arg(self.url)
    }

    /// Check the downloaded bytes.
    pub fn verify(&self, content: &[u8]) -> Result<(), DownloadError> {
        if content.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(DownloadError::Empty {
                url: self.url.to_string(),
            });
        }
        if looks_like_html(content) {
            return Err(DownloadError::HtmlPayload {
                url: self.url.to_string(),
            });
        }
        let actual = sha256_hex(content);
        match self.sha256 {
            Some(expected) if expected != actual => Err(DownloadError::ChecksumMismatch {
                url: self.url.to_string(),
                expected: expected.to_string(),
                actual,
            }),
            Some(_) => {
                info!(sha256 = %actual, "checksum verified");
                Ok(())
            }
            None => {
                info!(sha256 = %actual, "installer not pinned, recording checksum");
                Ok(())
            }
        }
    }

    /// Download, verify and run the script.
    ///
    /// The transfer is retried per `policy`; the script itself runs once.
    /// With a dry-run runner nothing is downloaded, so verification is skipped.
    pub fn fetch_and_run<R>(&self, runner: &mut R, policy: RetryPolicy) -> Result<(), DownloadError>
    where
        R: CommandRunner + ?Sized,
    {
        let script = tempfile::Builder::new()
            .prefix("hostprep-installer-")
            .suffix(".sh")
            .tempfile()?;
        let path = script.path();

        info!(url = self.url, "downloading installer");
        if let RetryOutcome::Failed { code, .. } = run_with_retry(runner, &self.curl(path), policy) {
            return Err(DownloadError::Transfer {
                url: self.url.to_string(),
                code,
            });
        }

        if runner.is_dry_run() {
            warn!("dry run: installer payload not verified");
        } else {
            let content = fs::read(path)?;
            self.verify(&content)?;
        }

        let run = Cmd::new("sh").arg_path(path);
        if let RetryOutcome::Failed { code, .. } = run_with_retry(runner, &run, RetryPolicy::ONCE) {
            return Err(DownloadError::Installer { code });
        }

        // Dropping the handle removes the script.
        script.close()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedRunner;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    const SCRIPT: &str = "#!/bin/sh\necho setting up repository\n";

    /// Make curl drop `body` at its `-o` destination and record that path.
    fn serving(body: &'static str, seen: Arc<Mutex<Option<PathBuf>>>) -> ScriptedRunner {
        ScriptedRunner::new().on("curl", move |cmd| {
            let args = cmd.get_args();
            let at = args.iter().position(|a| a == "-o").unwrap();
            let dest = PathBuf::from(&args[at + 1]);
            fs::write(&dest, body).unwrap();
            *seen.lock().unwrap() = Some(dest);
            0
        })
    }

    fn policy() -> RetryPolicy {
        RetryPolicy::new(2, Duration::ZERO)
    }

    #[test]
    fn test_html_detection() {
        assert!(looks_like_html(b"<!DOCTYPE html><html><body>404</body></html>"));
        assert!(looks_like_html(b"\n\n  <HTML>\n<head>"));
        assert!(!looks_like_html(SCRIPT.as_bytes()));
    }

    #[test]
    fn test_verify_checks_pinned_sha() {
        let good = sha256_hex(SCRIPT.as_bytes());
        let pinned = RemoteScript {
            url: "https://example.invalid/setup.sh",
            sha256: Some(good.as_str()),
        };
        assert!(pinned.verify(SCRIPT.as_bytes()).is_ok());

        let wrong = RemoteScript {
            url: "https://example.invalid/setup.sh",
            sha256: Some("00"),
        };
        assert!(matches!(
            wrong.verify(SCRIPT.as_bytes()),
            Err(DownloadError::ChecksumMismatch { .. })
        ));
        assert!(matches!(wrong.verify(b"  \n"), Err(DownloadError::Empty { .. })));
    }

    #[test]
    fn test_fetch_runs_script_and_removes_it() {
        let seen = Arc::new(Mutex::new(None));
        let mut runner = serving(SCRIPT, seen.clone());
        let remote = RemoteScript {
            url: "https://example.invalid/setup.sh",
            sha256: None,
        };

        remote.fetch_and_run(&mut runner, policy()).unwrap();

        let path = seen.lock().unwrap().clone().unwrap();
        assert_eq!(runner.calls.len(), 2);
        assert_eq!(runner.calls[1], format!("sh {}", path.display()));
        assert!(!path.exists());
    }

    #[test]
    fn test_html_payload_is_not_executed() {
        let seen = Arc::new(Mutex::new(None));
        let mut runner = serving("<html><body>Service Unavailable</body></html>", seen);
        let remote = RemoteScript {
            url: "https://example.invalid/setup.sh",
            sha256: None,
        };

        let err = remote.fetch_and_run(&mut runner, policy()).unwrap_err();

        assert!(matches!(err, DownloadError::HtmlPayload { .. }));
        assert_eq!(runner.count("sh "), 0);
    }

    #[test]
    fn test_transfer_failure_is_retried_then_reported() {
        let mut runner = ScriptedRunner::new().respond("curl", [22]);
        let remote = RemoteScript {
            url: "https://example.invalid/setup.sh",
            sha256: None,
        };

        let err = remote.fetch_and_run(&mut runner, policy()).unwrap_err();

        assert!(matches!(err, DownloadError::Transfer { code: 22, .. }));
        assert_eq!(runner.count("curl"), 2);
    }

    #[test]
    fn test_installer_failure_reports_code() {
        let seen = Arc::new(Mutex::new(None));
        let mut runner = serving(SCRIPT, seen).respond("sh ", [3]);
        let remote = RemoteScript {
            url: "https://example.invalid/setup.sh",
            sha256: None,
        };

        let err = remote.fetch_and_run(&mut runner, policy()).unwrap_err();
        assert!(matches!(err, DownloadError::Installer { code: 3 }));
    }
}
