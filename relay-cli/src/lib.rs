//! # relay-cli
//!
//! Argument parsing, config loading and subcommand handlers for the `relay` binary.

pub mod cli;
pub mod commands;
pub mod config;

pub use cli::{Cli, Commands};
pub use config::RelayConfig;
