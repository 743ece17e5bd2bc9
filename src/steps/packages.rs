//! apt-get steps: index refresh, upgrade, base tools, bonus games.

use crate::process::Cmd;

use super::{StepContext, StepError, StepOutcome};

/// Diagnostic and administration tools every host gets.
pub const BASE_PACKAGES: &[&str] = &[
    "curl",
    "wget",
    "vim",
    "htop",
    "net-tools",
    "dnsutils",
    "iputils-ping",
    "traceroute",
    "tcpdump",
    "nmap",
    "lsof",
    "mlocate",
    "openssh-server",
    "git",
    "unzip",
    "ca-certificates",
];

pub const GAME_PACKAGES: &[&str] = &["bsdgames", "cowsay", "fortune-mod", "sl", "cmatrix", "ninvaders"];

/// `apt-get` with prompts disabled.
pub fn apt<I, S>(args: I) -> Cmd
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Cmd::new("apt-get")
        .env("DEBIAN_FRONTEND", "noninteractive")
        .args(args)
}

pub fn install(packages: &[&str]) -> Cmd {
    apt(["install", "-y"]).args(packages)
}

pub fn refresh_index(ctx: &mut StepContext<'_>) -> Result<StepOutcome, StepError> {
    ctx.require(apt(["update"]))?;
    Ok(StepOutcome::ok())
}

pub fn upgrade(ctx: &mut StepContext<'_>) -> Result<StepOutcome, StepError> {
    ctx.require(apt(["upgrade", "-y"]))?;
    Ok(StepOutcome::ok())
}

pub fn base_packages(ctx: &mut StepContext<'_>) -> Result<StepOutcome, StepError> {
    ctx.require(install(BASE_PACKAGES))?;
    Ok(StepOutcome::done(format!("{} packages", BASE_PACKAGES.len())))
}

pub fn games(ctx: &mut StepContext<'_>) -> Result<StepOutcome, StepError> {
    ctx.require(install(GAME_PACKAGES))?;
    Ok(StepOutcome::done(GAME_PACKAGES.join(" ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_is_noninteractive() {
        let cmd = install(&["curl", "git"]);
        assert_eq!(cmd.argv(), vec!["apt-get", "install", "-y", "curl", "git"]);
        assert_eq!(
            cmd.get_envs(),
            &[("DEBIAN_FRONTEND".to_string(), "noninteractive".to_string())]
        );
    }
}
