//! Webmin admin panel from its upstream apt repository.

use tracing::warn;

use crate::download::RemoteScript;
use crate::services::{enable_unit, EnableOutcome};

use super::packages::{apt, install};
use super::{StepContext, StepError, StepOutcome};

pub const WEBMIN_UNIT: &str = "webmin.service";

pub fn webmin(ctx: &mut StepContext<'_>) -> Result<StepOutcome, StepError> {
    let config = ctx.config;
    let remote = RemoteScript {
        url: &config.webmin_url,
        sha256: config.webmin_sha256.as_deref(),
    };
    remote.fetch_and_run(&mut *ctx.runner, config.retry)?;

    ctx.require(apt(["update"]))?;
    ctx.require(install(&["webmin"]))?;

    match enable_unit(&mut *ctx.runner, &config.unit_dirs, WEBMIN_UNIT) {
        EnableOutcome::Enabled => Ok(StepOutcome::done("webmin installed, listening on :10000")),
        EnableOutcome::NotFound => {
            warn!(unit = WEBMIN_UNIT, "unit not found, not enabling");
            Ok(StepOutcome::warn(format!("installed, {} not found", WEBMIN_UNIT)))
        }
        EnableOutcome::Failed { code } => {
            warn!(unit = WEBMIN_UNIT, code, "could not enable unit");
            Ok(StepOutcome::warn(format!(
                "installed, {} failed to enable (exit code {})",
                WEBMIN_UNIT, code
            )))
        }
    }
}
