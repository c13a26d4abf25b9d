//! Permission CLI configuration
//!
//! Loaded from a TOML file passed with `--config`; every section and field is
//! optional and falls back to its default.

use std::path::{Path, PathBuf};

use permission_ble::{BluetoothPermissionConfig, DelegateQueue};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{CliError, Result};

/// Directory under the platform data dir used when none is configured
const APP_DIR_NAME: &str = "btperm";

// ----------------------------------------------------------------------------
// Application Configuration
// ----------------------------------------------------------------------------

/// Complete configuration for the permission CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Adapter configuration
    #[serde(deserialize_with = "deserialize_permission")]
    pub permission: BluetoothPermissionConfig,
    /// Where the persisted record lives
    pub state: StateConfig,
}

/// Persisted state location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// Directory holding the settings file
    pub state_dir: Option<PathBuf>,
    /// Settings file name inside the state directory
    pub file_name: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            // A CLI process has no main run loop to deliver notifications on.
            permission: BluetoothPermissionConfig::default()
                .with_delegate_queue(DelegateQueue::Background),
            state: StateConfig::default(),
        }
    }
}

/// Read the `[permission]` section, keeping the background queue unless set
fn deserialize_permission<'de, D>(
    deserializer: D,
) -> std::result::Result<BluetoothPermissionConfig, D::Error>
where
    D: Deserializer<'de>,
{
    let mut table = toml::Table::deserialize(deserializer)?;
    if !table.contains_key("delegate_queue") {
        let queue = toml::Value::try_from(DelegateQueue::Background)
            .map_err(serde::de::Error::custom)?;
        table.insert("delegate_queue".to_string(), queue);
    }
    toml::Value::Table(table)
        .try_into()
        .map_err(serde::de::Error::custom)
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            state_dir: None,
            file_name: "settings.json".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            CliError::Config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Resolve the settings file path
    pub fn state_file(&self) -> Result<PathBuf> {
        let dir = match &self.state.state_dir {
            Some(dir) => dir.clone(),
            None => dirs::data_dir()
                .map(|dir| dir.join(APP_DIR_NAME))
                .ok_or_else(|| {
                    CliError::Config("Could not determine a data directory".to_string())
                })?,
        };
        Ok(dir.join(&self.state.file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_use_background_queue() {
        let config = AppConfig::default();
        assert_eq!(config.permission.delegate_queue, DelegateQueue::Background);
        assert_eq!(config.state.file_name, "settings.json");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [permission]
            show_power_alert = true
            request_timeout_ms = 5000

            [state]
            state_dir = "/tmp/btperm-test"
            "#,
        )
        .unwrap();

        assert!(config.permission.show_power_alert);
        assert_eq!(config.permission.request_timeout_ms, Some(5000));
        assert_eq!(config.permission.delegate_queue, DelegateQueue::Background);
        assert_eq!(config.permission.settings_key, "permission.bluetooth");
        assert_eq!(
            config.state_file().unwrap(),
            PathBuf::from("/tmp/btperm-test/settings.json")
        );
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[permission]\ndelegate_queue = \"main\"").unwrap();

        let config = AppConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.permission.delegate_queue, DelegateQueue::Main);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = AppConfig::load_from_file(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(CliError::Config(_))));
    }
}
