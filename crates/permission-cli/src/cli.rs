//! Command-line interface definitions and parsing

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Data directory for the persisted permission state
    #[arg(short, long)]
    pub data_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the current Bluetooth permission status
    Status,
    /// Ask the OS for Bluetooth permission and wait for the answer
    Request {
        /// Give up after this many milliseconds (overrides the config file)
        #[arg(short, long)]
        timeout_ms: Option<u64>,
    },
    /// Forget the persisted permission state
    Reset,
    /// Print the persisted permission record
    ShowState,
}
