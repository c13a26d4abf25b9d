//! Bluetooth peripheral permission adapter
//!
//! This crate answers "may this app advertise as a Bluetooth peripheral?" and
//! asks the OS for that permission. It translates the platform's authorization
//! and power state into a [`PermissionStatus`] and remembers the last observed
//! status so an indeterminate manager state can still be answered.
//!
//! ## Architecture
//!
//! - [`config`] - Adapter configuration
//! - [`platform`] - Platform traits plus Core Bluetooth, BlueZ and fallback backends
//! - [`strategy`] - Status resolution, one strategy per authorization API
//! - [`pending`] - Requests waiting for the next manager notification
//! - [`permission`] - The adapter tying it together
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use permission_ble::{BluetoothPermission, BluetoothPermissionConfig, NativePlatform};
//! use permission_core::MemoryStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let permission = BluetoothPermission::new(
//!     Arc::new(NativePlatform::new()),
//!     Box::new(MemoryStore::new()),
//!     BluetoothPermissionConfig::default(),
//! );
//!
//! println!("current status: {}", permission.status());
//!
//! let status = permission.request().await?;
//! println!("after request: {}", status);
//! # Ok(())
//! # }
//! ```
//!
//! ## Platform Support
//!
//! - **macOS / iOS**: Core Bluetooth via `CBPeripheralManager`
//! - **Linux**: BlueZ via `bluer`; no permission model, status follows adapter power
//! - **Other platforms**: reports the manager as unsupported

pub mod config;
pub mod pending;
pub mod permission;
pub mod platform;
pub mod strategy;

// Public API exports
pub use config::{BluetoothPermissionConfig, DelegateQueue};
pub use permission::BluetoothPermission;
pub use platform::{
    BluetoothPlatform, ManagerOptions, NativePlatform, PeripheralManager, StateChangeHandler,
};
pub use strategy::{select_strategy, StatusContext, StatusStrategy};

// Re-export shared types for convenience
pub use permission_core::{
    AuthorizationApi, Callback, LegacyAuthorization, ManagerAuthorization, ManagerState,
    PermissionError, PermissionStatus, RequestId,
};
