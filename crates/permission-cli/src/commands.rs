//! Command handlers for the permission CLI

use std::path::Path;
use std::sync::Arc;

use permission_ble::BluetoothPermission;
use permission_core::PermissionError;
use tracing::{info, warn};

use crate::cli::Commands;
use crate::error::Result;

/// Command dispatcher for handling CLI commands
pub struct CommandDispatcher;

impl CommandDispatcher {
    /// Execute a CLI command
    pub async fn execute(
        command: Commands,
        permission: Arc<BluetoothPermission>,
        state_file: &Path,
    ) -> Result<()> {
        match command {
            Commands::Status => Self::handle_status_command(&permission),
            Commands::Request { .. } => Self::handle_request_command(&permission).await,
            Commands::Reset => Self::handle_reset_command(&permission),
            Commands::ShowState => Self::handle_show_state_command(&permission, state_file),
        }
    }

    fn handle_status_command(permission: &BluetoothPermission) -> Result<()> {
        println!("Authorization API: {}", permission.authorization_api());
        println!("Bluetooth permission: {}", permission.status());
        Ok(())
    }

    async fn handle_request_command(permission: &BluetoothPermission) -> Result<()> {
        info!("Requesting Bluetooth permission");
        match permission.request().await {
            Ok(status) => {
                if !status.is_authorized() {
                    warn!("Bluetooth permission was not granted ({})", status);
                }
                println!("Bluetooth permission: {}", status);
            }
            Err(PermissionError::RequestTimedOut { duration_ms, .. }) => println!(
                "No answer within {} ms, status is {}",
                duration_ms,
                permission.status()
            ),
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    fn handle_reset_command(permission: &BluetoothPermission) -> Result<()> {
        permission.reset()?;
        println!("Persisted Bluetooth permission state cleared");
        Ok(())
    }

    fn handle_show_state_command(permission: &BluetoothPermission, state_file: &Path) -> Result<()> {
        let record = permission.record()?;
        println!("State file: {}", state_file.display());
        println!("{}", serde_json::to_string_pretty(&record)?);
        Ok(())
    }
}
