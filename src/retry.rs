//! Fixed-delay retry for external commands.
//!
//! A command is attempted until it exits zero or the attempt budget is spent.
//! The delay between attempts is constant: no exponential growth, no jitter.
//! Whatever the command did on a failed attempt is left in place, so only
//! commands that are safe to re-run (`apt-get update`, `apt-get install`)
//! should be wrapped.

use std::time::Duration;

use tracing::{info, warn};

use crate::process::Cmd;
use crate::runner::{CommandRunner, SPAWN_FAILURE_CODE};

/// Attempt budget and delay for one command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Treated as at least 1.
    pub max_attempts: u32,
    /// Sleep between a failed attempt and the next one.
    pub delay: Duration,
}

impl RetryPolicy {
    /// Three attempts, three seconds apart.
    pub const DEFAULT: Self = Self {
        max_attempts: 3,
        delay: Duration::from_secs(3),
    };

    /// A single attempt, for commands that must not be repeated blindly.
    pub const ONCE: Self = Self {
        max_attempts: 1,
        delay: Duration::ZERO,
    };

    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Final result of a retried command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    Success { attempts: u32 },
    /// Budget exhausted; `code` is the exit code of the last attempt.
    Failed { attempts: u32, code: i32 },
}

impl RetryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RetryOutcome::Success { .. })
    }

    pub fn attempts(&self) -> u32 {
        match *self {
            RetryOutcome::Success { attempts } | RetryOutcome::Failed { attempts, .. } => attempts,
        }
    }
}

/// Run `cmd` through `runner`, retrying on non-zero exit.
///
/// A spawn failure counts as a failed attempt with exit code 127.
pub fn run_with_retry<R>(runner: &mut R, cmd: &Cmd, policy: RetryPolicy) -> RetryOutcome
where
    R: CommandRunner + ?Sized,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        let code = match runner.status(cmd) {
            Ok(code) => code,
            Err(err) => {
                warn!(command = %cmd, error = %err, "could not start command");
                SPAWN_FAILURE_CODE
            }
        };

        if code == 0 {
            if attempt > 1 {
                info!(command = %cmd, attempt, "command succeeded after retry");
            }
            return RetryOutcome::Success { attempts: attempt };
        }

        if attempt >= max_attempts {
            warn!(command = %cmd, attempt, max_attempts, code, "command failed, giving up");
            return RetryOutcome::Failed {
                attempts: attempt,
                code,
            };
        }

        warn!(
            command = %cmd,
            attempt,
            max_attempts,
            code,
            delay_secs = policy.delay.as_secs_f64(),
            "command failed, retrying"
        );
        runner.sleep(policy.delay);
    }
}
