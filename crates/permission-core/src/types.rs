//! Core types for permission adapters
//!
//! Platform enums carry the numeric encodings used by CoreBluetooth so that
//! platform bindings can convert raw values with `from_raw`. Values a newer OS
//! might introduce are preserved as `Other(raw)` rather than rejected.

use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::PermissionError;

// ----------------------------------------------------------------------------
// Permission Status
// ----------------------------------------------------------------------------

/// Status of a runtime permission as reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionStatus {
    /// The user has not been asked yet
    NotDetermined,
    /// The feature is unavailable (restricted, unsupported or switched off)
    Disabled,
    /// The user refused the permission
    Denied,
    /// The permission has been granted
    Authorized,
}

impl PermissionStatus {
    /// Stable lowercase name, also used for parsing
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionStatus::NotDetermined => "notDetermined",
            PermissionStatus::Disabled => "disabled",
            PermissionStatus::Denied => "denied",
            PermissionStatus::Authorized => "authorized",
        }
    }

    pub fn is_authorized(&self) -> bool {
        matches!(self, PermissionStatus::Authorized)
    }
}

impl fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionStatus {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "notDetermined" => Ok(PermissionStatus::NotDetermined),
            "disabled" => Ok(PermissionStatus::Disabled),
            "denied" => Ok(PermissionStatus::Denied),
            "authorized" => Ok(PermissionStatus::Authorized),
            other => Err(PermissionError::InvalidValue(format!(
                "unknown permission status '{}'",
                other
            ))),
        }
    }
}

// ----------------------------------------------------------------------------
// Platform Enums
// ----------------------------------------------------------------------------

/// Power state reported by a peripheral manager (`CBManagerState`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ManagerState {
    Unknown,
    Resetting,
    Unsupported,
    Unauthorized,
    PoweredOff,
    PoweredOn,
    Other(i64),
}

impl ManagerState {
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            0 => ManagerState::Unknown,
            1 => ManagerState::Resetting,
            2 => ManagerState::Unsupported,
            3 => ManagerState::Unauthorized,
            4 => ManagerState::PoweredOff,
            5 => ManagerState::PoweredOn,
            other => ManagerState::Other(other),
        }
    }

    pub fn is_powered_on(&self) -> bool {
        matches!(self, ManagerState::PoweredOn)
    }
}

/// Per-app or per-manager authorization (`CBManagerAuthorization`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ManagerAuthorization {
    NotDetermined,
    Restricted,
    Denied,
    AllowedAlways,
    Other(i64),
}

impl ManagerAuthorization {
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            0 => ManagerAuthorization::NotDetermined,
            1 => ManagerAuthorization::Restricted,
            2 => ManagerAuthorization::Denied,
            3 => ManagerAuthorization::AllowedAlways,
            other => ManagerAuthorization::Other(other),
        }
    }
}

impl From<ManagerAuthorization> for PermissionStatus {
    fn from(authorization: ManagerAuthorization) -> Self {
        match authorization {
            ManagerAuthorization::NotDetermined => PermissionStatus::NotDetermined,
            ManagerAuthorization::Restricted => PermissionStatus::Disabled,
            ManagerAuthorization::Denied => PermissionStatus::Denied,
            ManagerAuthorization::AllowedAlways => PermissionStatus::Authorized,
            ManagerAuthorization::Other(_) => PermissionStatus::NotDetermined,
        }
    }
}

/// Coarse authorization from the pre-`CBManagerAuthorization` API
/// (`CBPeripheralManagerAuthorizationStatus`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LegacyAuthorization {
    NotDetermined,
    Restricted,
    Denied,
    Authorized,
    Other(i64),
}

impl LegacyAuthorization {
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            0 => LegacyAuthorization::NotDetermined,
            1 => LegacyAuthorization::Restricted,
            2 => LegacyAuthorization::Denied,
            3 => LegacyAuthorization::Authorized,
            other => LegacyAuthorization::Other(other),
        }
    }
}

/// Which authorization API the running OS offers
///
/// Detected once per adapter; each variant selects a different resolution
/// strategy for the current status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthorizationApi {
    /// Per-app authorization readable without a manager instance
    AppWide,
    /// Authorization readable from a manager instance
    ManagerScoped,
    /// Only coarse authorization plus the manager's power state
    Legacy,
}

impl AuthorizationApi {
    /// Modern APIs surface the OS dialog as soon as a manager is created
    pub fn prompts_on_creation(&self) -> bool {
        !matches!(self, AuthorizationApi::Legacy)
    }
}

impl fmt::Display for AuthorizationApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthorizationApi::AppWide => write!(f, "app-wide"),
            AuthorizationApi::ManagerScoped => write!(f, "manager-scoped"),
            AuthorizationApi::Legacy => write!(f, "legacy"),
        }
    }
}

// ----------------------------------------------------------------------------
// Requests
// ----------------------------------------------------------------------------

/// Completion handler for a permission request
pub type Callback = Box<dyn FnOnce(PermissionStatus) + Send + 'static>;

/// Identifies one outstanding permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_only_authorized_is_authorized() {
        assert!(PermissionStatus::Authorized.is_authorized());
        assert!(!PermissionStatus::NotDetermined.is_authorized());
        assert!(!PermissionStatus::Disabled.is_authorized());
        assert!(!PermissionStatus::Denied.is_authorized());
    }

    #[test]
    fn test_manager_authorization_mapping() {
        let cases = [
            (ManagerAuthorization::NotDetermined, PermissionStatus::NotDetermined),
            (ManagerAuthorization::Restricted, PermissionStatus::Disabled),
            (ManagerAuthorization::Denied, PermissionStatus::Denied),
            (ManagerAuthorization::AllowedAlways, PermissionStatus::Authorized),
            (ManagerAuthorization::Other(42), PermissionStatus::NotDetermined),
        ];

        for (authorization, expected) in cases {
            assert_eq!(PermissionStatus::from(authorization), expected);
        }
    }

    #[test]
    fn test_manager_state_raw_values() {
        assert_eq!(ManagerState::from_raw(0), ManagerState::Unknown);
        assert_eq!(ManagerState::from_raw(1), ManagerState::Resetting);
        assert_eq!(ManagerState::from_raw(2), ManagerState::Unsupported);
        assert_eq!(ManagerState::from_raw(3), ManagerState::Unauthorized);
        assert_eq!(ManagerState::from_raw(4), ManagerState::PoweredOff);
        assert_eq!(ManagerState::from_raw(5), ManagerState::PoweredOn);
        assert_eq!(ManagerState::from_raw(9), ManagerState::Other(9));
    }

    #[test]
    fn test_status_string_round_trip() {
        for status in [
            PermissionStatus::NotDetermined,
            PermissionStatus::Disabled,
            PermissionStatus::Denied,
            PermissionStatus::Authorized,
        ] {
            assert_eq!(status.as_str().parse::<PermissionStatus>().unwrap(), status);
        }
        assert!("maybe".parse::<PermissionStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_camel_case() {
        let json = serde_json::to_string(&PermissionStatus::NotDetermined).unwrap();
        assert_eq!(json, "\"notDetermined\"");
    }

    #[test]
    fn test_only_legacy_needs_advertise_prompt() {
        assert!(AuthorizationApi::AppWide.prompts_on_creation());
        assert!(AuthorizationApi::ManagerScoped.prompts_on_creation());
        assert!(!AuthorizationApi::Legacy.prompts_on_creation());
    }

    proptest! {
        #[test]
        fn prop_unknown_authorization_is_not_determined(raw in 4i64..) {
            let authorization = ManagerAuthorization::from_raw(raw);
            prop_assert_eq!(authorization, ManagerAuthorization::Other(raw));
            prop_assert_eq!(PermissionStatus::from(authorization), PermissionStatus::NotDetermined);
        }

        #[test]
        fn prop_state_conversion_is_total(raw in any::<i64>()) {
            let state = ManagerState::from_raw(raw);
            if (0..=5).contains(&raw) {
                prop_assert!(!matches!(state, ManagerState::Other(_)));
            } else {
                prop_assert_eq!(state, ManagerState::Other(raw));
            }
        }
    }
}
