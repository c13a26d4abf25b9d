//! Linux backend using bluer (BlueZ)
//!
//! BlueZ has no per-app Bluetooth permission, so the coarse authorization is
//! always granted and the reported status follows the default adapter's power
//! state. Adapter property changes are forwarded as state notifications.

use std::sync::{Arc, Mutex};

use bluer::{AdapterEvent, AdapterProperty};
use futures::StreamExt;
use permission_core::{
    AuthorizationApi, LegacyAuthorization, ManagerAuthorization, ManagerState, PermissionError,
    Result as PermissionResult,
};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{BluetoothPlatform, ManagerOptions, PeripheralManager, StateChangeHandler};

// ----------------------------------------------------------------------------
// Linux Implementation
// ----------------------------------------------------------------------------

/// BlueZ backend; needs a tokio runtime to watch the adapter
pub struct BluezPlatform {
    runtime: Handle,
}

impl BluezPlatform {
    /// Bind to the current tokio runtime
    pub fn new() -> PermissionResult<Self> {
        let runtime = Handle::try_current().map_err(|e| {
            PermissionError::Platform(format!("BlueZ backend needs a tokio runtime: {}", e))
        })?;
        Ok(Self { runtime })
    }
}

impl BluetoothPlatform for BluezPlatform {
    fn name(&self) -> &'static str {
        "bluez"
    }

    fn authorization_api(&self) -> AuthorizationApi {
        AuthorizationApi::Legacy
    }

    fn app_authorization(&self) -> ManagerAuthorization {
        ManagerAuthorization::AllowedAlways
    }

    fn manager_authorization(&self) -> ManagerAuthorization {
        ManagerAuthorization::AllowedAlways
    }

    fn legacy_authorization(&self) -> LegacyAuthorization {
        LegacyAuthorization::Authorized
    }

    fn create_manager(
        &self,
        _options: &ManagerOptions,
        on_state_change: StateChangeHandler,
    ) -> PermissionResult<Box<dyn PeripheralManager>> {
        let state = Arc::new(Mutex::new(ManagerState::Unknown));
        let watcher = self
            .runtime
            .spawn(watch_adapter(state.clone(), on_state_change));

        info!("BlueZ peripheral manager created");
        Ok(Box::new(BluezManager { state, watcher }))
    }
}

/// Track the default adapter's power state until the manager is dropped
async fn watch_adapter(state: Arc<Mutex<ManagerState>>, on_state_change: StateChangeHandler) {
    let update = |new_state: ManagerState| {
        *state.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = new_state;
        on_state_change();
    };

    let session = match bluer::Session::new().await {
        Ok(session) => session,
        Err(e) => {
            warn!("BlueZ session unavailable: {}", e);
            update(ManagerState::Unsupported);
            return;
        }
    };

    let adapter = match session.default_adapter().await {
        Ok(adapter) => adapter,
        Err(e) => {
            warn!("No BLE adapter available: {}", e);
            update(ManagerState::Unsupported);
            return;
        }
    };

    let powered = adapter.is_powered().await.unwrap_or(false);
    update(power_state(powered));

    let events = match adapter.events().await {
        Ok(events) => events,
        Err(e) => {
            warn!("Cannot watch adapter {}: {}", adapter.name(), e);
            return;
        }
    };
    let mut events = Box::pin(events);

    while let Some(event) = events.next().await {
        if let AdapterEvent::PropertyChanged(AdapterProperty::Powered(powered)) = event {
            debug!("Adapter {} powered: {}", adapter.name(), powered);
            update(power_state(powered));
        }
    }
}

fn power_state(powered: bool) -> ManagerState {
    if powered {
        ManagerState::PoweredOn
    } else {
        ManagerState::PoweredOff
    }
}

/// Peripheral manager view of a BlueZ adapter
pub struct BluezManager {
    state: Arc<Mutex<ManagerState>>,
    watcher: JoinHandle<()>,
}

impl PeripheralManager for BluezManager {
    fn state(&self) -> ManagerState {
        *self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn start_advertising(&self) {
        // BlueZ shows no permission dialog, so there is nothing to provoke.
        debug!("start_advertising is a no-op on BlueZ");
    }

    fn stop_advertising(&self) {
        debug!("stop_advertising is a no-op on BlueZ");
    }
}

impl Drop for BluezManager {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_state_mapping() {
        assert_eq!(power_state(true), ManagerState::PoweredOn);
        assert_eq!(power_state(false), ManagerState::PoweredOff);
    }

    #[test]
    fn test_requires_runtime() {
        assert!(BluezPlatform::new().is_err());
    }
}
