//! Test utilities for the Bluetooth permission adapter
//!
//! Provides a scriptable platform whose authorization values and manager
//! power state can be changed between calls, and which records every manager
//! creation and advertise call. State notifications are only delivered when a
//! test calls [`MockPlatform::notify`].

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use permission_ble::{
    BluetoothPermission, BluetoothPermissionConfig, BluetoothPlatform, ManagerOptions,
    PeripheralManager, StateChangeHandler,
};
use permission_core::{
    AuthorizationApi, BluetoothRecord, LegacyAuthorization, ManagerAuthorization, ManagerHistory,
    ManagerState, MemoryStore, PermissionError, PermissionStatus, Result as PermissionResult,
    DEFAULT_BLUETOOTH_KEY,
};

// ----------------------------------------------------------------------------
// Mock Platform
// ----------------------------------------------------------------------------

#[derive(Debug)]
struct MockSettings {
    api: AuthorizationApi,
    app_authorization: ManagerAuthorization,
    manager_authorization: ManagerAuthorization,
    legacy_authorization: LegacyAuthorization,
    fail_creation: bool,
}

/// Scriptable platform for deterministic adapter tests
#[derive(Clone)]
pub struct MockPlatform {
    settings: Arc<Mutex<MockSettings>>,
    state: Arc<Mutex<ManagerState>>,
    handler: Arc<Mutex<Option<StateChangeHandler>>>,
    last_options: Arc<Mutex<Option<ManagerOptions>>>,
    managers_created: Arc<AtomicUsize>,
    advertise_starts: Arc<AtomicUsize>,
    advertise_stops: Arc<AtomicUsize>,
}

impl MockPlatform {
    pub fn new(api: AuthorizationApi) -> Self {
        Self {
            settings: Arc::new(Mutex::new(MockSettings {
                api,
                app_authorization: ManagerAuthorization::NotDetermined,
                manager_authorization: ManagerAuthorization::NotDetermined,
                legacy_authorization: LegacyAuthorization::NotDetermined,
                fail_creation: false,
            })),
            state: Arc::new(Mutex::new(ManagerState::Unknown)),
            handler: Arc::new(Mutex::new(None)),
            last_options: Arc::new(Mutex::new(None)),
            managers_created: Arc::new(AtomicUsize::new(0)),
            advertise_starts: Arc::new(AtomicUsize::new(0)),
            advertise_stops: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn legacy() -> Self {
        Self::new(AuthorizationApi::Legacy)
    }

    pub fn set_app_authorization(&self, authorization: ManagerAuthorization) {
        self.settings.lock().unwrap().app_authorization = authorization;
    }

    pub fn set_manager_authorization(&self, authorization: ManagerAuthorization) {
        self.settings.lock().unwrap().manager_authorization = authorization;
    }

    pub fn set_legacy_authorization(&self, authorization: LegacyAuthorization) {
        self.settings.lock().unwrap().legacy_authorization = authorization;
    }

    pub fn set_state(&self, state: ManagerState) {
        *self.state.lock().unwrap() = state;
    }

    pub fn fail_creation(&self, fail: bool) {
        self.settings.lock().unwrap().fail_creation = fail;
    }

    /// Deliver a state-change notification, as the OS would
    pub fn notify(&self) {
        let handler = self.handler.lock().unwrap().clone();
        if let Some(handler) = handler {
            handler();
        }
    }

    /// Change the power state and notify
    pub fn transition(&self, state: ManagerState) {
        self.set_state(state);
        self.notify();
    }

    pub fn managers_created(&self) -> usize {
        self.managers_created.load(Ordering::SeqCst)
    }

    pub fn advertise_starts(&self) -> usize {
        self.advertise_starts.load(Ordering::SeqCst)
    }

    pub fn advertise_stops(&self) -> usize {
        self.advertise_stops.load(Ordering::SeqCst)
    }

    pub fn last_options(&self) -> Option<ManagerOptions> {
        *self.last_options.lock().unwrap()
    }
}

impl BluetoothPlatform for MockPlatform {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn authorization_api(&self) -> AuthorizationApi {
        self.settings.lock().unwrap().api
    }

    fn app_authorization(&self) -> ManagerAuthorization {
        self.settings.lock().unwrap().app_authorization
    }

    fn manager_authorization(&self) -> ManagerAuthorization {
        self.settings.lock().unwrap().manager_authorization
    }

    fn legacy_authorization(&self) -> LegacyAuthorization {
        self.settings.lock().unwrap().legacy_authorization
    }

    fn create_manager(
        &self,
        options: &ManagerOptions,
        on_state_change: StateChangeHandler,
    ) -> PermissionResult<Box<dyn PeripheralManager>> {
        if self.settings.lock().unwrap().fail_creation {
            return Err(PermissionError::manager_unavailable("mock creation failure"));
        }

        self.managers_created.fetch_add(1, Ordering::SeqCst);
        *self.last_options.lock().unwrap() = Some(*options);
        *self.handler.lock().unwrap() = Some(on_state_change);

        Ok(Box::new(MockManager {
            state: self.state.clone(),
            advertise_starts: self.advertise_starts.clone(),
            advertise_stops: self.advertise_stops.clone(),
        }))
    }
}

/// Manager handed out by [`MockPlatform`]
pub struct MockManager {
    state: Arc<Mutex<ManagerState>>,
    advertise_starts: Arc<AtomicUsize>,
    advertise_stops: Arc<AtomicUsize>,
}

impl PeripheralManager for MockManager {
    fn state(&self) -> ManagerState {
        *self.state.lock().unwrap()
    }

    fn start_advertising(&self) {
        self.advertise_starts.fetch_add(1, Ordering::SeqCst);
    }

    fn stop_advertising(&self) {
        self.advertise_stops.fetch_add(1, Ordering::SeqCst);
    }
}

// ----------------------------------------------------------------------------
// Environment Helpers
// ----------------------------------------------------------------------------

/// Adapter wired to a mock platform and a shared memory store
pub struct TestEnvironment {
    pub platform: MockPlatform,
    pub store: MemoryStore,
    pub permission: Arc<BluetoothPermission>,
}

impl TestEnvironment {
    pub fn new(platform: MockPlatform) -> Self {
        Self::with_config(platform, BluetoothPermissionConfig::default())
    }

    pub fn with_config(platform: MockPlatform, config: BluetoothPermissionConfig) -> Self {
        Self::with_store(platform, MemoryStore::new(), config)
    }

    pub fn with_store(
        platform: MockPlatform,
        store: MemoryStore,
        config: BluetoothPermissionConfig,
    ) -> Self {
        let permission = BluetoothPermission::new(
            Arc::new(platform.clone()),
            Box::new(store.clone()),
            config,
        );
        Self {
            platform,
            store,
            permission,
        }
    }

    /// Persisted record, read straight from the shared store
    pub fn stored_record(&self) -> BluetoothRecord {
        BluetoothRecord::load(&self.store, DEFAULT_BLUETOOTH_KEY).unwrap()
    }

    /// Seed the store before the adapter reads it
    pub fn seed(&self, requested: bool, history: ManagerHistory) {
        let mut store = self.store.clone();
        BluetoothRecord {
            requested,
            manager: history,
        }
        .save(&mut store, DEFAULT_BLUETOOTH_KEY)
        .unwrap();
    }
}

/// Callback that records every status it receives
pub fn recording_callback() -> (
    Arc<Mutex<Vec<PermissionStatus>>>,
    Box<dyn FnOnce(PermissionStatus) + Send + 'static>,
) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    (
        seen,
        Box::new(move |status| sink.lock().unwrap().push(status)),
    )
}
