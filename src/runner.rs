//! The seam between provisioning steps and the host.
//!
//! Steps never spawn processes or sleep directly. They go through a
//! [`CommandRunner`], which the binary backs with [`SystemRunner`] (or
//! [`DryRunRunner`] for `--dry-run`) and tests back with
//! [`ScriptedRunner`](crate::testing::ScriptedRunner).

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info};

use crate::process::{self, Cmd};

/// Exit code reported when a program could not be spawned at all.
pub const SPAWN_FAILURE_CODE: i32 = 127;

pub trait CommandRunner {
    /// Run `cmd` once and return its exit code (0 is success).
    ///
    /// `Err` means the process could not be started.
    fn status(&mut self, cmd: &Cmd) -> Result<i32>;

    /// Block for `delay` between retry attempts.
    fn sleep(&mut self, delay: Duration) {
        std::thread::sleep(delay);
    }

    /// Locate an optional tool on PATH.
    fn locate(&self, program: &str) -> Option<PathBuf> {
        process::which(program)
    }

    /// True when commands are only being reported, not executed.
    fn is_dry_run(&self) -> bool {
        false
    }
}

/// Runs commands on the host with inherited stdio.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn status(&mut self, cmd: &Cmd) -> Result<i32> {
        debug!(command = %cmd, "spawning");
        let status = cmd.run_interactive()?;
        // Killed by a signal: no exit code, report as a generic failure.
        Ok(status.code().unwrap_or(1))
    }
}

/// Logs each command instead of running it and reports success.
#[derive(Debug, Default)]
pub struct DryRunRunner {
    pub executed: Vec<String>,
}

impl CommandRunner for DryRunRunner {
    fn status(&mut self, cmd: &Cmd) -> Result<i32> {
        info!(command = %cmd, "dry run: would execute");
        self.executed.push(cmd.to_string());
        Ok(0)
    }

    fn sleep(&mut self, _delay: Duration) {}

    fn is_dry_run(&self) -> bool {
        true
    }
}
