//! The fixed provisioning pipeline.
//!
//! Steps run strictly in [`STEPS`] order. Each entry carries its failure
//! class: a [`Severity::Fatal`] failure ends the run with the step's exit
//! code, a [`Severity::Feature`] failure aborts only that optional feature,
//! and a [`Severity::Advisory`] failure is logged as a warning.

mod report;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::cli::Options;
use crate::steps::{self, StepContext, StepError, StepOutcome, StepStatus};
use crate::timing::Timer;

pub use report::{RunReport, StepRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Fatal,
    Feature,
    Advisory,
}

type StepFn = fn(&mut StepContext<'_>) -> Result<StepOutcome, StepError>;

pub struct Step {
    pub name: &'static str,
    pub severity: Severity,
    /// Whether the flags ask for this step.
    pub enabled: fn(&Options) -> bool,
    pub run: StepFn,
}

fn always(_: &Options) -> bool {
    true
}

pub const STEPS: &[Step] = &[
    Step {
        name: "refresh-index",
        severity: Severity::Fatal,
        enabled: always,
        run: steps::packages::refresh_index,
    },
    Step {
        name: "upgrade",
        severity: Severity::Fatal,
        enabled: always,
        run: steps::packages::upgrade,
    },
    Step {
        name: "base-packages",
        severity: Severity::Fatal,
        enabled: always,
        run: steps::packages::base_packages,
    },
    Step {
        name: "locate-index",
        severity: Severity::Advisory,
        enabled: always,
        run: steps::system::locate_index,
    },
    Step {
        name: "ssh-service",
        severity: Severity::Advisory,
        enabled: always,
        run: steps::system::ssh_service,
    },
    Step {
        name: "network-wizard",
        severity: Severity::Advisory,
        enabled: |o| o.network_wizard,
        run: steps::system::network_wizard,
    },
    Step {
        name: "netbios",
        severity: Severity::Feature,
        enabled: |o| o.netbios_enabled(),
        run: steps::netbios::netbios,
    },
    Step {
        name: "webmin",
        severity: Severity::Feature,
        enabled: |o| o.webmin,
        run: steps::webmin::webmin,
    },
    Step {
        name: "games",
        severity: Severity::Advisory,
        enabled: |o| o.games,
        run: steps::packages::games,
    },
    Step {
        name: "shell-profile",
        severity: Severity::Advisory,
        enabled: always,
        run: steps::shell::shell_profile,
    },
];

/// Run every enabled step in order.
pub fn run(ctx: &mut StepContext<'_>) -> RunReport {
    run_steps(STEPS, ctx)
}

pub fn run_steps(steps: &[Step], ctx: &mut StepContext<'_>) -> RunReport {
    let mut report = RunReport::new(*ctx.options);

    for step in steps {
        if !(step.enabled)(ctx.options) {
            report.push(StepRecord::not_requested(step));
            continue;
        }

        info!(step = step.name, "starting");
        let timer = Timer::start(step.name);
        let result = (step.run)(ctx);
        let elapsed = timer.finish();

        match result {
            Ok(outcome) => {
                match outcome.status {
                    StepStatus::Warn => warn!(step = step.name, detail = ?outcome.detail, "completed with warnings"),
                    StepStatus::Skipped => warn!(step = step.name, detail = ?outcome.detail, "skipped"),
                    _ => info!(step = step.name, detail = ?outcome.detail, "done"),
                }
                report.push(StepRecord::from_outcome(step, outcome, elapsed));
            }
            Err(err) => match step.severity {
                Severity::Fatal => {
                    error!(step = step.name, error = %err, "fatal step failed, aborting");
                    report.push(StepRecord::failed(step, StepStatus::Failed, &err, elapsed));
                    report.abort(step.name, err.exit_code());
                    return report;
                }
                Severity::Feature => {
                    error!(step = step.name, error = %err, "feature aborted, continuing");
                    report.push(StepRecord::failed(step, StepStatus::Failed, &err, elapsed));
                }
                Severity::Advisory => {
                    warn!(step = step.name, error = %err, "advisory step failed, continuing");
                    report.push(StepRecord::failed(step, StepStatus::Warn, &err, elapsed));
                }
            },
        }
    }

    info!("provisioning complete");
    report
}
