//! hostprep - provision a freshly installed Debian-family host.
//!
//! Refreshes and upgrades packages, installs a base toolset, enables ssh,
//! optionally layers on NetBIOS resolution, Webmin and terminal games, and
//! uncomments the colorized `ls` block of root's shell profile.

use std::process::ExitCode;

use hostprep::cli;
use hostprep::commands;
use hostprep::config::Config;
use hostprep::error::RunError;
use hostprep::privilege;
use hostprep::runner::{CommandRunner, DryRunRunner, SystemRunner};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hostprep=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Flags come first: --dry-run decides whether root is required.
    let options = match cli::parse_from(std::env::args_os()) {
        Ok(options) => options,
        Err(err) => {
            // Prints usage for errors and the text itself for --help/--version.
            let _ = err.print();
            return exit_code(RunError::Arguments(err).exit_code());
        }
    };

    // Load .env if present
    dotenvy::dotenv().ok();
    let config = Config::load();

    let mut runner: Box<dyn CommandRunner> = if options.dry_run {
        Box::new(DryRunRunner::default())
    } else {
        Box::new(SystemRunner)
    };

    match commands::cmd_provision(&options, &config, runner.as_mut(), privilege::is_root()) {
        Ok(report) => exit_code(report.exit_code),
        Err(err) => {
            eprintln!("Error: {}", err);
            exit_code(err.exit_code())
        }
    }
}
