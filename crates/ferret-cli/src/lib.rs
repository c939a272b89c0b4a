//! Ferret CLI library.
//!
//! This library provides the configuration layering and command
//! implementations behind the `ferret` binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use cli::{Cli, Command, LogFormat, Overrides};
pub use config::Config;
pub use error::{CliError, Result};
