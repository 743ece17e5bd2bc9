//! Named provisioning steps.
//!
//! Each step is a plain function over a [`StepContext`]. Steps report what
//! they did through [`StepOutcome`] and fail with [`StepError`]; whether a
//! failure stops the run is decided by the pipeline, not here.

pub mod netbios;
pub mod packages;
pub mod shell;
pub mod system;
pub mod webmin;

use serde::Serialize;
use thiserror::Error;

use crate::cli::Options;
use crate::config::Config;
use crate::download::DownloadError;
use crate::patch::{PatchError, PatchMode};
use crate::process::Cmd;
use crate::retry::{run_with_retry, RetryOutcome, RetryPolicy};
use crate::runner::CommandRunner;

/// Everything a step may use.
pub struct StepContext<'a> {
    pub options: &'a Options,
    pub config: &'a Config,
    pub runner: &'a mut dyn CommandRunner,
}

impl<'a> StepContext<'a> {
    pub fn new(options: &'a Options, config: &'a Config, runner: &'a mut dyn CommandRunner) -> Self {
        Self {
            options,
            config,
            runner,
        }
    }

    pub fn patch_mode(&self) -> PatchMode {
        if self.runner.is_dry_run() {
            PatchMode::DryRun
        } else {
            PatchMode::Write
        }
    }

    /// Run `cmd` with the configured retry budget; failure is an error.
    pub fn require(&mut self, cmd: Cmd) -> Result<(), StepError> {
        self.require_with(cmd, self.config.retry)
    }

    /// Run `cmd` exactly once; failure is an error.
    pub fn require_once(&mut self, cmd: Cmd) -> Result<(), StepError> {
        self.require_with(cmd, RetryPolicy::ONCE)
    }

    fn require_with(&mut self, cmd: Cmd, policy: RetryPolicy) -> Result<(), StepError> {
        match run_with_retry(&mut *self.runner, &cmd, policy) {
            RetryOutcome::Success { .. } => Ok(()),
            RetryOutcome::Failed { attempts, code } => Err(StepError::Command {
                command: cmd.to_string(),
                attempts,
                code,
            }),
        }
    }
}

/// How a step ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Ok,
    /// Target already in the desired state.
    Unchanged,
    /// Completed, but some best-effort part did not.
    Warn,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub status: StepStatus,
    pub detail: Option<String>,
}

impl StepOutcome {
    pub fn ok() -> Self {
        Self {
            status: StepStatus::Ok,
            detail: None,
        }
    }

    fn with(status: StepStatus, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: Some(detail.into()),
        }
    }

    pub fn done(detail: impl Into<String>) -> Self {
        Self::with(StepStatus::Ok, detail)
    }

    pub fn unchanged(detail: impl Into<String>) -> Self {
        Self::with(StepStatus::Unchanged, detail)
    }

    pub fn warn(detail: impl Into<String>) -> Self {
        Self::with(StepStatus::Warn, detail)
    }

    pub fn skipped(detail: impl Into<String>) -> Self {
        Self::with(StepStatus::Skipped, detail)
    }

    /// `Warn` listing `warnings` if there are any, `ok` otherwise.
    pub fn from_warnings(warnings: Vec<String>, ok: Self) -> Self {
        if warnings.is_empty() {
            ok
        } else {
            Self::warn(warnings.join("; "))
        }
    }
}

#[derive(Debug, Error)]
pub enum StepError {
    #[error("`{command}` failed after {attempts} attempt(s) (exit code {code})")]
    Command {
        command: String,
        attempts: u32,
        code: i32,
    },

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    Patch(#[from] PatchError),
}

impl StepError {
    /// Process exit code when this error ends the run.
    ///
    /// Command failures propagate the command's own exit code.
    pub fn exit_code(&self) -> i32 {
        match self {
            StepError::Command { code, .. } if (1..=255).contains(code) => *code,
            _ => 1,
        }
    }
}
