//! NetBIOS name resolution via Samba and winbind.
//!
//! Package installation failing aborts the feature. Service enablement and
//! the config edits are best-effort and only downgrade the step to a warning.

use tracing::warn;

use crate::config::Config;
use crate::patch::{self, Change, MissingLine, PatchRule};
use crate::services::{enable_unit, EnableOutcome};

use super::packages::install;
use super::{StepContext, StepError, StepOutcome};

pub const NETBIOS_PACKAGES: &[&str] = &["samba", "winbind", "libnss-winbind", "smbclient"];

pub const NETBIOS_UNITS: &[&str] = &["smbd.service", "nmbd.service", "winbind.service"];

/// Appended to nsswitch.conf when it has no `hosts:` line at all.
pub const DEFAULT_HOSTS_LINE: &str = "hosts: files mdns4_minimal [NOTFOUND=return] dns wins";

pub const WINS_TOKEN: &str = "wins";

/// Samba resolution order for `--netbios-local`: no WINS server, no DNS.
pub const LOCAL_RESOLVE_ORDER: &str = "lmhosts bcast";

pub fn nsswitch_rule(config: &Config) -> Result<PatchRule, patch::PatchError> {
    Ok(PatchRule::append_token(&config.nsswitch, "hosts:", WINS_TOKEN)?
        .on_missing_line(MissingLine::Append(DEFAULT_HOSTS_LINE.to_string())))
}

pub fn smb_conf_rule(config: &Config) -> Result<PatchRule, patch::PatchError> {
    PatchRule::ini_value(&config.smb_conf, "global", "name resolve order", LOCAL_RESOLVE_ORDER)
}

fn describe(change: &Change) -> &'static str {
    match change {
        Change::AlreadyApplied => "already applied",
        Change::NoMatch => "no matching line",
        _ => "patched",
    }
}

pub fn netbios(ctx: &mut StepContext<'_>) -> Result<StepOutcome, StepError> {
    let config = ctx.config;
    ctx.require(install(NETBIOS_PACKAGES))?;

    let mut warnings = Vec::new();
    for unit in NETBIOS_UNITS {
        match enable_unit(&mut *ctx.runner, &config.unit_dirs, unit) {
            EnableOutcome::Enabled => {}
            EnableOutcome::NotFound => {
                warn!(unit, "unit not found, not enabling");
                warnings.push(format!("{} not found", unit));
            }
            EnableOutcome::Failed { code } => {
                warn!(unit, code, "could not enable unit");
                warnings.push(format!("{} failed to enable (exit code {})", unit, code));
            }
        }
    }

    let mode = ctx.patch_mode();
    let mut notes = Vec::new();
    match nsswitch_rule(config).and_then(|rule| patch::apply(&rule, mode)) {
        Ok(outcome) => notes.push(format!("nsswitch: {}", describe(&outcome.change))),
        Err(err) => {
            warn!(error = %err, "nsswitch.conf not patched");
            warnings.push(format!("nsswitch: {}", err));
        }
    }

    if ctx.options.netbios_local {
        match smb_conf_rule(config).and_then(|rule| patch::apply(&rule, mode)) {
            Ok(outcome) if outcome.change == Change::NoMatch => {
                warnings.push("smb.conf: no [global] section".to_string());
            }
            Ok(outcome) => notes.push(format!("smb.conf: {}", describe(&outcome.change))),
            Err(err) => {
                warn!(error = %err, "smb.conf not patched");
                warnings.push(format!("smb.conf: {}", err));
            }
        }
    }

    Ok(StepOutcome::from_warnings(warnings, StepOutcome::done(notes.join(", "))))
}
