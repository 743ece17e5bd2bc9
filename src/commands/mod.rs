//! CLI command handlers.

mod provision;

pub use provision::cmd_provision;
