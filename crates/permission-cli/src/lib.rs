//! Bluetooth permission CLI library
//!
//! Command-line plumbing around the permission adapter: argument parsing,
//! TOML configuration and command handlers.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use cli::{Cli, Commands};
pub use commands::CommandDispatcher;
pub use config::AppConfig;
pub use error::{CliError, Result};
