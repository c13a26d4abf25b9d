//! Fallback backend for platforms without peripheral support

use permission_core::{
    AuthorizationApi, LegacyAuthorization, ManagerAuthorization, ManagerState,
    Result as PermissionResult,
};
use tracing::{debug, warn};

use super::{BluetoothPlatform, ManagerOptions, PeripheralManager, StateChangeHandler};

// ----------------------------------------------------------------------------
// Fallback Implementation
// ----------------------------------------------------------------------------

/// Backend for platforms where Bluetooth peripherals are not supported
#[derive(Debug, Default)]
pub struct UnsupportedPlatform;

impl UnsupportedPlatform {
    pub fn new() -> Self {
        Self
    }
}

impl BluetoothPlatform for UnsupportedPlatform {
    fn name(&self) -> &'static str {
        "unsupported"
    }

    fn authorization_api(&self) -> AuthorizationApi {
        AuthorizationApi::Legacy
    }

    fn app_authorization(&self) -> ManagerAuthorization {
        ManagerAuthorization::NotDetermined
    }

    fn manager_authorization(&self) -> ManagerAuthorization {
        ManagerAuthorization::NotDetermined
    }

    fn legacy_authorization(&self) -> LegacyAuthorization {
        LegacyAuthorization::NotDetermined
    }

    fn create_manager(
        &self,
        _options: &ManagerOptions,
        on_state_change: StateChangeHandler,
    ) -> PermissionResult<Box<dyn PeripheralManager>> {
        warn!(
            "Bluetooth peripherals are not supported on this platform. \
            The permission will report as disabled once the manager settles."
        );

        // Report the (fixed) state the way a real manager would: once, later.
        std::thread::spawn(move || on_state_change());

        Ok(Box::new(UnsupportedManager))
    }
}

/// Manager that is permanently in the unsupported state
#[derive(Debug)]
pub struct UnsupportedManager;

impl PeripheralManager for UnsupportedManager {
    fn state(&self) -> ManagerState {
        ManagerState::Unsupported
    }

    fn start_advertising(&self) {
        debug!("Ignoring start_advertising on unsupported platform");
    }

    fn stop_advertising(&self) {}
}
