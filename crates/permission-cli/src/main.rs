//! btperm - inspect and request Bluetooth peripheral permission

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use permission_ble::{BluetoothPermission, NativePlatform};
use permission_cli::{
    cli::{Cli, Commands},
    commands::CommandDispatcher,
    config::AppConfig,
    error::Result,
};
use permission_core::FileStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    setup_logging(cli.verbose);

    // Load configuration
    let mut config = load_configuration(&cli)?;

    // Override state directory if specified
    if let Some(data_dir) = &cli.data_dir {
        config.state.state_dir = Some(data_dir.into());
    }

    if let Commands::Request {
        timeout_ms: Some(timeout_ms),
    } = &cli.command
    {
        config.permission = config
            .permission
            .with_request_timeout(Some(Duration::from_millis(*timeout_ms)));
    }

    let state_file = config.state_file()?;
    let store = FileStore::open(&state_file)?;
    info!("Using state file: {}", store.path().display());

    let permission = BluetoothPermission::new(
        Arc::new(NativePlatform::new()),
        Box::new(store),
        config.permission,
    );

    if let Err(e) = CommandDispatcher::execute(cli.command, permission, &state_file).await {
        error!("Command execution failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Setup logging based on verbosity level
fn setup_logging(verbose: bool) {
    let log_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// Load configuration from file or use defaults
fn load_configuration(cli: &Cli) -> Result<AppConfig> {
    if let Some(config_path) = &cli.config {
        info!("Loading configuration from: {}", config_path);
        AppConfig::load_from_file(config_path)
    } else {
        info!("Using default configuration");
        Ok(AppConfig::default())
    }
}
