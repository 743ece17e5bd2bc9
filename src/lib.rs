//! hostprep library exports for testing.
//!
//! The binary is a thin shell over [`commands::cmd_provision`]; everything
//! it drives lives here so integration tests can run the pipeline against a
//! [`testing::ScriptedRunner`] and temporary files.

pub mod cli;
pub mod commands;
pub mod config;
pub mod download;
pub mod error;
pub mod patch;
pub mod pipeline;
pub mod privilege;
pub mod process;
pub mod retry;
pub mod runner;
pub mod services;
pub mod steps;
pub mod testing;
pub mod timing;
