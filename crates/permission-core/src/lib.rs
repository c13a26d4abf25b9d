//! Permission Core Types
//!
//! This crate provides the shared building blocks for runtime permission
//! adapters: the [`PermissionStatus`] enumeration handed back to callers, the
//! raw platform enums an adapter translates from, the persisted settings store
//! used to remember the last observed state, and the common error type.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod errors;
pub mod record;
pub mod storage;
pub mod types;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use errors::{PermissionError, Result};
pub use record::{BluetoothRecord, ManagerHistory, DEFAULT_BLUETOOTH_KEY};
pub use storage::{FileStore, MemoryStore, SettingsStore};
pub use types::{
    AuthorizationApi, Callback, LegacyAuthorization, ManagerAuthorization, ManagerState,
    PermissionStatus, RequestId,
};
