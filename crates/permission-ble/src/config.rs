//! Bluetooth permission configuration

use std::time::Duration;

use permission_core::DEFAULT_BLUETOOTH_KEY;

// ----------------------------------------------------------------------------
// Configuration
// ----------------------------------------------------------------------------

/// Queue the platform delivers manager notifications on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelegateQueue {
    /// The platform default (the main queue on Apple platforms)
    #[default]
    Main,
    /// A global background queue, for processes without a main run loop
    Background,
}

/// Configuration for the Bluetooth permission adapter
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BluetoothPermissionConfig {
    /// Let the OS show its "Bluetooth is off" alert when the manager is created
    pub show_power_alert: bool,
    /// Settings key the permission record is persisted under
    pub settings_key: String,
    /// Give up on an async request after this many milliseconds (unbounded when unset)
    pub request_timeout_ms: Option<u64>,
    /// Notification delivery queue
    pub delegate_queue: DelegateQueue,
}

impl Default for BluetoothPermissionConfig {
    fn default() -> Self {
        Self {
            show_power_alert: false,
            settings_key: DEFAULT_BLUETOOTH_KEY.to_string(),
            request_timeout_ms: None,
            delegate_queue: DelegateQueue::Main,
        }
    }
}

impl BluetoothPermissionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the OS power alert
    pub fn with_power_alert(mut self, enabled: bool) -> Self {
        self.show_power_alert = enabled;
        self
    }

    /// Set the settings key
    pub fn with_settings_key(mut self, key: String) -> Self {
        self.settings_key = key;
        self
    }

    /// Set the async request timeout
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout_ms = timeout.map(|t| (t.as_millis() as u64).max(1));
        self
    }

    /// Set the notification delivery queue
    pub fn with_delegate_queue(mut self, queue: DelegateQueue) -> Self {
        self.delegate_queue = queue;
        self
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_suppress_power_alert() {
        let config = BluetoothPermissionConfig::default();
        assert!(!config.show_power_alert);
        assert_eq!(config.settings_key, DEFAULT_BLUETOOTH_KEY);
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.delegate_queue, DelegateQueue::Main);
    }

    #[test]
    fn test_builder_setters() {
        let config = BluetoothPermissionConfig::new()
            .with_power_alert(true)
            .with_settings_key("custom".to_string())
            .with_request_timeout(Some(Duration::from_secs(30)))
            .with_delegate_queue(DelegateQueue::Background);

        assert!(config.show_power_alert);
        assert_eq!(config.settings_key, "custom");
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.delegate_queue, DelegateQueue::Background);
    }

    #[test]
    fn test_sub_millisecond_timeout_rounds_up() {
        let config =
            BluetoothPermissionConfig::new().with_request_timeout(Some(Duration::from_micros(10)));
        assert_eq!(config.request_timeout_ms, Some(1));
    }
}
