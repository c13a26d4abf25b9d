//! Persisted Bluetooth permission record
//!
//! The request flag and the manager history are written together as one JSON
//! value, so readers never observe a status without the matching
//! "determined" marker.

use serde::{Deserialize, Serialize};

use crate::{PermissionStatus, Result, SettingsStore};

/// Default key the record is stored under
pub const DEFAULT_BLUETOOTH_KEY: &str = "permission.bluetooth";

// ----------------------------------------------------------------------------
// Manager History
// ----------------------------------------------------------------------------

/// What the peripheral manager has reported so far
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ManagerHistory {
    /// No state-change notification has ever been received
    #[default]
    Undetermined,
    /// At least one notification arrived; carries the last computed status
    Determined(PermissionStatus),
}

impl ManagerHistory {
    pub fn is_determined(&self) -> bool {
        matches!(self, ManagerHistory::Determined(_))
    }

    /// Last known status, only present once the manager has been determined
    pub fn last_status(&self) -> Option<PermissionStatus> {
        match self {
            ManagerHistory::Undetermined => None,
            ManagerHistory::Determined(status) => Some(*status),
        }
    }
}

// ----------------------------------------------------------------------------
// Bluetooth Record
// ----------------------------------------------------------------------------

/// Persisted Bluetooth permission state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BluetoothRecord {
    /// A request is waiting for the next manager notification
    #[serde(default)]
    pub requested: bool,
    /// Manager history and cached status
    #[serde(default)]
    pub manager: ManagerHistory,
}

impl BluetoothRecord {
    /// Load the record stored under `key`, defaulting when absent
    pub fn load(store: &dyn SettingsStore, key: &str) -> Result<Self> {
        match store.retrieve(key)? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Self::default()),
        }
    }

    /// Persist the record under `key` in a single write
    pub fn save(&self, store: &mut dyn SettingsStore, key: &str) -> Result<()> {
        let bytes = serde_json::to_vec(self)?;
        store.store(key, bytes)
    }

    /// Record a manager notification together with the status it produced
    pub fn determined(self, status: PermissionStatus) -> Self {
        Self {
            manager: ManagerHistory::Determined(status),
            ..self
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
