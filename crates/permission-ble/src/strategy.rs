//! Status resolution strategies
//!
//! One strategy is picked per adapter from the platform's
//! [`AuthorizationApi`]; the adapter never re-checks capabilities afterwards.

use permission_core::{
    AuthorizationApi, LegacyAuthorization, ManagerHistory, ManagerState, PermissionStatus,
};

use crate::platform::{BluetoothPlatform, PeripheralManager};

// ----------------------------------------------------------------------------
// Strategy Trait
// ----------------------------------------------------------------------------

/// Inputs available when resolving a status
pub struct StatusContext<'a> {
    pub platform: &'a dyn BluetoothPlatform,
    pub manager: Option<&'a dyn PeripheralManager>,
    pub history: ManagerHistory,
}

/// Translates platform state into a [`PermissionStatus`]
pub trait StatusStrategy: Send + Sync {
    /// The authorization API this strategy reads
    fn api(&self) -> AuthorizationApi;

    /// Whether status queries need a live manager instance
    fn needs_manager(&self) -> bool {
        false
    }

    /// Compute the current status
    fn resolve(&self, context: &StatusContext<'_>) -> PermissionStatus;
}

/// Pick the strategy matching the platform's authorization API
pub fn select_strategy(api: AuthorizationApi) -> Box<dyn StatusStrategy> {
    match api {
        AuthorizationApi::AppWide => Box::new(AppWideStrategy),
        AuthorizationApi::ManagerScoped => Box::new(ManagerScopedStrategy),
        AuthorizationApi::Legacy => Box::new(LegacyStrategy),
    }
}

// ----------------------------------------------------------------------------
// Modern Strategies
// ----------------------------------------------------------------------------

/// Per-app authorization, no manager needed
#[derive(Debug, Default)]
pub struct AppWideStrategy;

impl StatusStrategy for AppWideStrategy {
    fn api(&self) -> AuthorizationApi {
        AuthorizationApi::AppWide
    }

    fn resolve(&self, context: &StatusContext<'_>) -> PermissionStatus {
        context.platform.app_authorization().into()
    }
}

/// Authorization read from a manager instance
#[derive(Debug, Default)]
pub struct ManagerScopedStrategy;

impl StatusStrategy for ManagerScopedStrategy {
    fn api(&self) -> AuthorizationApi {
        AuthorizationApi::ManagerScoped
    }

    fn resolve(&self, context: &StatusContext<'_>) -> PermissionStatus {
        context.platform.manager_authorization().into()
    }
}

// ----------------------------------------------------------------------------
// Legacy Strategy
// ----------------------------------------------------------------------------

/// Coarse authorization, then power state, then the persisted cache
#[derive(Debug, Default)]
pub struct LegacyStrategy;

impl StatusStrategy for LegacyStrategy {
    fn api(&self) -> AuthorizationApi {
        AuthorizationApi::Legacy
    }

    fn needs_manager(&self) -> bool {
        true
    }

    fn resolve(&self, context: &StatusContext<'_>) -> PermissionStatus {
        match context.platform.legacy_authorization() {
            LegacyAuthorization::Restricted => return PermissionStatus::Disabled,
            LegacyAuthorization::Denied => return PermissionStatus::Denied,
            LegacyAuthorization::NotDetermined
            | LegacyAuthorization::Authorized
            | LegacyAuthorization::Other(_) => {}
        }

        let cached = match context.history {
            ManagerHistory::Undetermined => return PermissionStatus::NotDetermined,
            ManagerHistory::Determined(status) => status,
        };

        let Some(manager) = context.manager else {
            return PermissionStatus::Disabled;
        };

        match manager.state() {
            ManagerState::Unsupported | ManagerState::PoweredOff => PermissionStatus::Disabled,
            ManagerState::Unauthorized => PermissionStatus::Denied,
            ManagerState::PoweredOn => PermissionStatus::Authorized,
            ManagerState::Resetting | ManagerState::Unknown => cached,
            ManagerState::Other(_) => PermissionStatus::NotDetermined,
        }
    }
}
