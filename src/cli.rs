//! Command-line flags.
//!
//! Flags are parsed once into an immutable [`Options`] value that every step
//! receives explicitly.

use clap::Parser;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "hostprep")]
#[command(about = "Provision a freshly installed Debian-family host")]
#[command(
    after_help = "Always runs: package refresh + upgrade, base tools, locate index, ssh.\n\
                  Must be run as root (except with --dry-run).\n\
                  Configuration: HOSTPREP_* variables or a .env file in the working directory."
)]
pub struct Cli {
    /// Reserved: accepted for compatibility, does nothing yet
    #[arg(long)]
    pub network_wizard: bool,

    /// Install Samba/winbind and resolve hosts via WINS
    #[arg(long)]
    pub netbios: bool,

    /// Like --netbios, and restrict Samba name resolution to lmhosts + broadcast
    #[arg(long)]
    pub netbios_local: bool,

    /// Install the Webmin admin panel from its upstream repository
    #[arg(long)]
    pub webmin: bool,

    /// Install a handful of terminal games
    #[arg(long)]
    pub games: bool,

    /// Log every command and file edit instead of performing it
    #[arg(long)]
    pub dry_run: bool,
}

/// Parsed run options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Options {
    pub network_wizard: bool,
    pub netbios: bool,
    pub netbios_local: bool,
    pub webmin: bool,
    pub games: bool,
    pub dry_run: bool,
}

impl Options {
    /// The NetBIOS stack is wanted by either NetBIOS flag.
    pub fn netbios_enabled(&self) -> bool {
        self.netbios || self.netbios_local
    }
}

impl From<Cli> for Options {
    fn from(cli: Cli) -> Self {
        Self {
            network_wizard: cli.network_wizard,
            netbios: cli.netbios,
            netbios_local: cli.netbios_local,
            webmin: cli.webmin,
            games: cli.games,
            dry_run: cli.dry_run,
        }
    }
}

/// Parse `args` (including the program name) into [`Options`].
pub fn parse_from<I, T>(args: I) -> Result<Options, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args).map(Options::from)
}
