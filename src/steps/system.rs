//! Host housekeeping: locate index, ssh service, network wizard placeholder.

use tracing::{info, warn};

use crate::process::Cmd;
use crate::services::{enable_unit, EnableOutcome};

use super::{StepContext, StepError, StepOutcome};

pub const SSH_UNIT: &str = "ssh.service";

/// Rebuild the locate database if `updatedb` is installed.
pub fn locate_index(ctx: &mut StepContext<'_>) -> Result<StepOutcome, StepError> {
    let Some(updatedb) = ctx.runner.locate("updatedb") else {
        warn!("updatedb not found, skipping locate index");
        return Ok(StepOutcome::skipped("updatedb not found"));
    };
    ctx.require_once(Cmd::new(updatedb.to_string_lossy()))?;
    Ok(StepOutcome::ok())
}

pub fn ssh_service(ctx: &mut StepContext<'_>) -> Result<StepOutcome, StepError> {
    match enable_unit(&mut *ctx.runner, &ctx.config.unit_dirs, SSH_UNIT) {
        EnableOutcome::Enabled => Ok(StepOutcome::done(SSH_UNIT)),
        EnableOutcome::NotFound => {
            warn!(unit = SSH_UNIT, "unit not found, not enabling");
            Ok(StepOutcome::skipped(format!("{} not found", SSH_UNIT)))
        }
        EnableOutcome::Failed { code } => Err(StepError::Command {
            command: format!("systemctl enable --now {}", SSH_UNIT),
            attempts: 1,
            code,
        }),
    }
}

/// Accepted flag with no behaviour behind it.
pub fn network_wizard(_ctx: &mut StepContext<'_>) -> Result<StepOutcome, StepError> {
    info!("--network-wizard is reserved and not implemented, nothing to do");
    Ok(StepOutcome::skipped("reserved, not implemented"))
}
