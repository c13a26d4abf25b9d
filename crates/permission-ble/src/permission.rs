//! Bluetooth permission adapter

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use permission_core::{
    AuthorizationApi, BluetoothRecord, Callback, PermissionError, PermissionStatus, RequestId,
    Result as PermissionResult, SettingsStore,
};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::config::BluetoothPermissionConfig;
use crate::pending::{resolve_all, PendingRequests};
use crate::platform::{BluetoothPlatform, ManagerOptions, PeripheralManager, StateChangeHandler};
use crate::strategy::{select_strategy, StatusContext, StatusStrategy};

// ----------------------------------------------------------------------------
// Adapter State
// ----------------------------------------------------------------------------

struct Inner {
    store: Box<dyn SettingsStore>,
    manager: Option<Box<dyn PeripheralManager>>,
    pending: PendingRequests,
}

// ----------------------------------------------------------------------------
// Bluetooth Permission
// ----------------------------------------------------------------------------

/// Bluetooth peripheral permission adapter
///
/// Owns the lazily created peripheral manager, the persisted record and the
/// pending requests. Always handed out as `Arc<Self>` because the platform
/// keeps a weak reference for state-change notifications.
pub struct BluetoothPermission {
    platform: Arc<dyn BluetoothPlatform>,
    strategy: Box<dyn StatusStrategy>,
    config: BluetoothPermissionConfig,
    inner: Mutex<Inner>,
    this: Weak<Self>,
}

impl BluetoothPermission {
    /// Create an adapter, selecting the status strategy from the platform
    pub fn new(
        platform: Arc<dyn BluetoothPlatform>,
        store: Box<dyn SettingsStore>,
        config: BluetoothPermissionConfig,
    ) -> Arc<Self> {
        let api = platform.authorization_api();
        info!(
            "Bluetooth permission adapter using {} backend ({} authorization)",
            platform.name(),
            api
        );
        if !store.is_available() {
            warn!("Settings store unavailable, permission state will not persist");
        }

        Arc::new_cyclic(|this| Self {
            strategy: select_strategy(api),
            platform,
            config,
            inner: Mutex::new(Inner {
                store,
                manager: None,
                pending: PendingRequests::new(),
            }),
            this: this.clone(),
        })
    }

    /// Authorization API selected for this adapter
    pub fn authorization_api(&self) -> AuthorizationApi {
        self.strategy.api()
    }

    pub fn config(&self) -> &BluetoothPermissionConfig {
        &self.config
    }

    /// Current permission status
    ///
    /// On the legacy path this creates the peripheral manager if needed,
    /// which on a real device may surface the OS permission prompt.
    pub fn status(&self) -> PermissionStatus {
        let mut inner = self.lock();
        if self.strategy.needs_manager() {
            self.ensure_manager(&mut inner);
        }
        let record = self.load_record(&inner);
        self.resolve(&inner, record)
    }

    /// Ask the OS for permission
    ///
    /// `callback` is never invoked from inside this call; it fires on the
    /// next manager state-change notification.
    pub fn request_permission(&self, callback: Callback) -> RequestId {
        let id = RequestId::new();
        let mut inner = self.lock();

        let mut record = self.load_record(&inner);
        record.requested = true;
        self.save_record(&mut inner, &record);
        inner.pending.insert(id, callback);
        debug!("Registered Bluetooth permission request {}", id);

        self.ensure_manager(&mut inner);

        if self.strategy.api().prompts_on_creation() {
            // The OS shows its dialog when the manager is created.
            return id;
        }

        let Some(manager) = inner.manager.as_ref() else {
            debug!("No peripheral manager, cannot prompt for request {}", id);
            return id;
        };

        let state = manager.state();
        if !state.is_powered_on() {
            debug!(
                "Peripheral manager is {:?}, deferring prompt for request {}",
                state, id
            );
            return id;
        }

        // An empty advertisement is the only way to raise the legacy dialog.
        manager.start_advertising();
        manager.stop_advertising();
        id
    }

    /// Ask the OS for permission and wait for the outcome
    ///
    /// Honours the configured request timeout; without one this waits until
    /// the manager reports a state. Dropping the future cancels the request.
    pub async fn request(&self) -> PermissionResult<PermissionStatus> {
        let (tx, rx) = oneshot::channel();
        let id = self.request_permission(Box::new(move |status| {
            let _ = tx.send(status);
        }));
        let mut guard = RequestGuard {
            permission: self,
            id,
            armed: true,
        };

        let outcome = match self.config.request_timeout() {
            Some(timeout) => match tokio::time::timeout(timeout, rx).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    return Err(PermissionError::RequestTimedOut {
                        request_id: id.to_string(),
                        duration_ms: timeout.as_millis() as u64,
                    });
                }
            },
            None => rx.await,
        };

        let status = outcome.map_err(|_| PermissionError::RequestCancelled {
            request_id: id.to_string(),
        })?;
        guard.armed = false;
        Ok(status)
    }

    /// Drop a pending request without resolving it
    ///
    /// Clears the persisted request flag once nothing is left waiting.
    pub fn cancel(&self, id: RequestId) -> bool {
        let mut inner = self.lock();
        let removed = inner.pending.remove(id).is_some();

        if removed && inner.pending.is_empty() {
            let mut record = self.load_record(&inner);
            if record.requested {
                record.requested = false;
                self.save_record(&mut inner, &record);
            }
        }

        if removed {
            debug!("Cancelled Bluetooth permission request {}", id);
        }
        removed
    }

    /// Number of requests waiting for a notification
    pub fn pending_requests(&self) -> usize {
        self.lock().pending.len()
    }

    /// Whether the peripheral manager has been created
    pub fn has_manager(&self) -> bool {
        self.lock().manager.is_some()
    }

    /// Persisted record as currently stored
    pub fn record(&self) -> PermissionResult<BluetoothRecord> {
        let inner = self.lock();
        BluetoothRecord::load(inner.store.as_ref(), &self.config.settings_key)
    }

    /// Forget everything persisted about this permission
    pub fn reset(&self) -> PermissionResult<()> {
        let mut inner = self.lock();
        inner.store.delete(&self.config.settings_key)?;
        info!("Cleared persisted Bluetooth permission state");
        Ok(())
    }

    /// Entry point for the platform's manager state-change notification
    pub fn on_manager_state_changed(&self) {
        let (status, waiters) = {
            let mut inner = self.lock();
            let record = self.load_record(&inner);

            // The manager counts as determined before the status is computed.
            let cached = record
                .manager
                .last_status()
                .unwrap_or(PermissionStatus::NotDetermined);
            let status = self.resolve(&inner, record.determined(cached));

            let record = record.determined(status);
            self.save_record(&mut inner, &record);
            info!("Bluetooth manager state changed, permission is {}", status);

            if !record.requested && inner.pending.is_empty() {
                return;
            }
            (status, inner.pending.take_all())
        };

        resolve_all(waiters, status);

        let mut inner = self.lock();
        if inner.pending.is_empty() {
            let mut record = self.load_record(&inner);
            if record.requested {
                record.requested = false;
                self.save_record(&mut inner, &record);
            }
        }
    }

    /// Handler given to the platform; holds only a weak reference
    fn state_change_handler(&self) -> StateChangeHandler {
        let this = self.this.clone();
        Arc::new(move || {
            if let Some(permission) = this.upgrade() {
                permission.on_manager_state_changed();
            }
        })
    }

    fn ensure_manager(&self, inner: &mut Inner) {
        if inner.manager.is_some() {
            return;
        }

        let options = ManagerOptions {
            show_power_alert: self.config.show_power_alert,
            delegate_queue: self.config.delegate_queue,
        };

        match self
            .platform
            .create_manager(&options, self.state_change_handler())
        {
            Ok(manager) => {
                debug!("Peripheral manager created");
                inner.manager = Some(manager);
            }
            Err(e) => warn!("Failed to create peripheral manager: {}", e),
        }
    }

    fn resolve(&self, inner: &Inner, record: BluetoothRecord) -> PermissionStatus {
        let context = StatusContext {
            platform: self.platform.as_ref(),
            manager: inner.manager.as_deref(),
            history: record.manager,
        };
        self.strategy.resolve(&context)
    }

    fn load_record(&self, inner: &Inner) -> BluetoothRecord {
        BluetoothRecord::load(inner.store.as_ref(), &self.config.settings_key).unwrap_or_else(
            |e| {
                warn!("Failed to load Bluetooth permission record: {}", e);
                BluetoothRecord::default()
            },
        )
    }

    fn save_record(&self, inner: &mut Inner, record: &BluetoothRecord) {
        if let Err(e) = record.save(inner.store.as_mut(), &self.config.settings_key) {
            warn!("Failed to persist Bluetooth permission record: {}", e);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Cancels an async request that ends without an answer
struct RequestGuard<'a> {
    permission: &'a BluetoothPermission,
    id: RequestId,
    armed: bool,
}

impl Drop for RequestGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.permission.cancel(self.id);
        }
    }
}

impl std::fmt::Debug for BluetoothPermission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BluetoothPermission")
            .field("platform", &self.platform.name())
            .field("api", &self.strategy.api())
            .field("config", &self.config)
            .finish()
    }
}
