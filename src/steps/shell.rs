//! Root shell profile personalisation.

use crate::patch::{self, MissingFile};

use super::{StepContext, StepError, StepOutcome};

/// Debian 11's stock `/root/.bashrc`, written when the profile is missing.
///
/// Lines 9-13 are the commented-out colorized `ls` block. Debian 12 grew the
/// note by a line, which shifts that block to 10-14 (`HOSTPREP_BASHRC_LINES`).
pub const DEFAULT_BASHRC: &str = r#"# ~/.bashrc: executed by bash(1) for non-login shells.

# Note: PS1 and umask are already set in /etc/profile. You should not
# need this unless you want different defaults for root.
# PS1='${debian_chroot:+($debian_chroot)}\h:\w\$ '
# umask 022

# You may uncomment the following lines if you want `ls' to be colorized:
# export LS_OPTIONS='--color=auto'
# eval "$(dircolors)"
# alias ls='ls $LS_OPTIONS'
# alias ll='ls $LS_OPTIONS -l'
# alias l='ls $LS_OPTIONS -lA'
#
# Some more alias to avoid making mistakes:
# alias rm='rm -i'
# alias cp='cp -i'
# alias mv='mv -i'
"#;

pub fn shell_profile(ctx: &mut StepContext<'_>) -> Result<StepOutcome, StepError> {
    let (start, end) = ctx.config.bashrc_lines;
    let outcome = patch::uncomment_range(
        &ctx.config.bashrc,
        start,
        end,
        &MissingFile::Create(DEFAULT_BASHRC.to_string()),
        ctx.patch_mode(),
    )?;

    let range = format!("lines {}-{}", start, end);
    if outcome.missing > 0 {
        return Ok(StepOutcome::warn(format!(
            "{}: file ends {} line(s) early",
            range, outcome.missing
        )));
    }
    if outcome.uncommented.is_empty() {
        return Ok(StepOutcome::unchanged(format!("{} already uncommented", range)));
    }
    Ok(StepOutcome::done(format!(
        "{}: uncommented {}",
        range,
        outcome.uncommented.len()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile_range_is_the_ls_block() {
        let lines: Vec<&str> = DEFAULT_BASHRC.lines().collect();
        assert!(lines[8].starts_with("# export LS_OPTIONS"));
        assert!(lines[12].starts_with("# alias l="));
        assert_eq!(lines[13], "#");
    }
}
