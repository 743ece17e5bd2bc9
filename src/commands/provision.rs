//! Provision command - privilege gate, pipeline, summary.

use tracing::{error, info, warn};

use crate::cli::Options;
use crate::config::Config;
use crate::error::RunError;
use crate::pipeline::{self, RunReport};
use crate::runner::CommandRunner;
use crate::steps::StepContext;

/// Execute the provisioning pipeline.
///
/// `privileged` is the caller's root check. Without it (and without
/// `--dry-run`) nothing runs at all.
pub fn cmd_provision(
    options: &Options,
    config: &Config,
    runner: &mut dyn CommandRunner,
    privileged: bool,
) -> Result<RunReport, RunError> {
    if !privileged && !options.dry_run {
        error!("not running as root, refusing to provision");
        return Err(RunError::Privilege);
    }
    if options.dry_run {
        info!("dry run: commands are logged, files are left untouched");
    }

    let mut ctx = StepContext::new(options, config, runner);
    let report = pipeline::run(&mut ctx);
    report.print();

    if let Some(path) = &config.report {
        match report.write_json(path) {
            Ok(()) => info!(path = %path.display(), "run report written"),
            Err(err) => warn!(error = %err, "could not write run report"),
        }
    }

    Ok(report)
}
