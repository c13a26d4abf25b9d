//! Cross-platform peripheral manager traits and platform detection

#[cfg(target_os = "linux")]
pub mod bluez;
#[cfg(any(target_os = "macos", target_os = "ios"))]
pub mod corebluetooth;
pub mod fallback;

use std::sync::Arc;

use permission_core::{
    AuthorizationApi, LegacyAuthorization, ManagerAuthorization, ManagerState,
    Result as PermissionResult,
};

use crate::config::DelegateQueue;

// ----------------------------------------------------------------------------
// Platform Traits
// ----------------------------------------------------------------------------

/// Invoked by the platform whenever a manager reports a new state
pub type StateChangeHandler = Arc<dyn Fn() + Send + Sync>;

/// Construction options for a peripheral manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManagerOptions {
    /// Let the OS show its power alert on creation
    pub show_power_alert: bool,
    /// Queue notifications are delivered on
    pub delegate_queue: DelegateQueue,
}

/// Handle to a native peripheral manager
pub trait PeripheralManager: Send + Sync {
    /// Current power state
    fn state(&self) -> ManagerState;

    /// Start advertising with no payload
    fn start_advertising(&self);

    /// Stop advertising
    fn stop_advertising(&self);
}

/// Bluetooth authorization surface of the host OS
///
/// Implementations must deliver state-change notifications asynchronously,
/// never from inside `create_manager` on the calling thread.
pub trait BluetoothPlatform: Send + Sync {
    /// Short name for logging
    fn name(&self) -> &'static str;

    /// Which authorization API the running OS offers
    fn authorization_api(&self) -> AuthorizationApi;

    /// Per-app authorization, available without a manager
    fn app_authorization(&self) -> ManagerAuthorization;

    /// Authorization read from a (transient) manager instance
    fn manager_authorization(&self) -> ManagerAuthorization;

    /// Coarse authorization from the pre-modern API
    fn legacy_authorization(&self) -> LegacyAuthorization;

    /// Create a peripheral manager that reports state changes to `on_state_change`
    fn create_manager(
        &self,
        options: &ManagerOptions,
        on_state_change: StateChangeHandler,
    ) -> PermissionResult<Box<dyn PeripheralManager>>;
}

// ----------------------------------------------------------------------------
// Platform Detection and Factory
// ----------------------------------------------------------------------------

/// Platform-specific backend
pub enum NativePlatform {
    #[cfg(any(target_os = "macos", target_os = "ios"))]
    CoreBluetooth(corebluetooth::CoreBluetoothPlatform),
    #[cfg(target_os = "linux")]
    Bluez(bluez::BluezPlatform),
    #[allow(dead_code)]
    Unsupported(fallback::UnsupportedPlatform),
}

impl NativePlatform {
    /// Create the appropriate backend for the current platform
    pub fn new() -> Self {
        #[cfg(any(target_os = "macos", target_os = "ios"))]
        {
            Self::CoreBluetooth(corebluetooth::CoreBluetoothPlatform::new())
        }
        #[cfg(target_os = "linux")]
        {
            match bluez::BluezPlatform::new() {
                Ok(platform) => Self::Bluez(platform),
                Err(e) => {
                    tracing::warn!("BlueZ backend unavailable ({}), falling back", e);
                    Self::Unsupported(fallback::UnsupportedPlatform::new())
                }
            }
        }
        #[cfg(not(any(target_os = "macos", target_os = "ios", target_os = "linux")))]
        {
            Self::Unsupported(fallback::UnsupportedPlatform::new())
        }
    }

    fn backend(&self) -> &dyn BluetoothPlatform {
        match self {
            #[cfg(any(target_os = "macos", target_os = "ios"))]
            Self::CoreBluetooth(ref platform) => platform,
            #[cfg(target_os = "linux")]
            Self::Bluez(ref platform) => platform,
            Self::Unsupported(ref platform) => platform,
        }
    }
}

impl Default for NativePlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl BluetoothPlatform for NativePlatform {
    fn name(&self) -> &'static str {
        self.backend().name()
    }

    fn authorization_api(&self) -> AuthorizationApi {
        self.backend().authorization_api()
    }

    fn app_authorization(&self) -> ManagerAuthorization {
        self.backend().app_authorization()
    }

    fn manager_authorization(&self) -> ManagerAuthorization {
        self.backend().manager_authorization()
    }

    fn legacy_authorization(&self) -> LegacyAuthorization {
        self.backend().legacy_authorization()
    }

    fn create_manager(
        &self,
        options: &ManagerOptions,
        on_state_change: StateChangeHandler,
    ) -> PermissionResult<Box<dyn PeripheralManager>> {
        self.backend().create_manager(options, on_state_change)
    }
}
