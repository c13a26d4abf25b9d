//! Apple backend using Core Bluetooth
//!
//! Capability detection probes the Objective-C runtime instead of comparing OS
//! versions: `+[CBManager authorization]` means per-app authorization,
//! `-[CBPeripheralManager authorization]` means manager-scoped authorization,
//! anything older only has `+[CBPeripheralManager authorizationStatus]`.

use std::ffi::c_void;
use std::panic::AssertUnwindSafe;
use std::sync::OnceLock;

use objc::declare::ClassDecl;
use objc::runtime::{Class, Object, Protocol, Sel, BOOL, NO, YES};
use objc::{class, msg_send, sel, sel_impl};
use objc_foundation::{INSString, NSString};
use permission_core::{
    AuthorizationApi, LegacyAuthorization, ManagerAuthorization, ManagerState, PermissionError,
    Result as PermissionResult,
};
use tracing::{debug, info, warn};

use crate::config::DelegateQueue;

use super::{BluetoothPlatform, ManagerOptions, PeripheralManager, StateChangeHandler};

type Id = *mut Object;

const NIL: Id = std::ptr::null_mut();

/// Value of `CBPeripheralManagerOptionShowPowerAlertKey`
const SHOW_POWER_ALERT_KEY: &str = "kCBInitOptionShowPowerAlert";

const DELEGATE_CLASS_NAME: &str = "PermissionBlePeripheralDelegate";
const HANDLER_IVAR: &str = "_stateChangeHandler";

#[link(name = "CoreBluetooth", kind = "framework")]
extern "C" {}

extern "C" {
    fn dispatch_get_global_queue(identifier: isize, flags: usize) -> Id;
}

// ----------------------------------------------------------------------------
// Delegate Class
// ----------------------------------------------------------------------------

extern "C" fn peripheral_manager_did_update_state(this: &Object, _cmd: Sel, _manager: Id) {
    let result = std::panic::catch_unwind(AssertUnwindSafe(|| unsafe {
        let handler: *mut c_void = *this.get_ivar(HANDLER_IVAR);
        if !handler.is_null() {
            let handler = &*(handler as *const StateChangeHandler);
            handler();
        }
    }));

    if result.is_err() {
        warn!("State change handler panicked inside Core Bluetooth delegate");
    }
}

/// Objective-C class forwarding `peripheralManagerDidUpdateState:` to Rust
fn delegate_class() -> Option<&'static Class> {
    static CLASS: OnceLock<Option<&'static Class>> = OnceLock::new();

    *CLASS.get_or_init(|| {
        let Some(mut decl) = ClassDecl::new(DELEGATE_CLASS_NAME, class!(NSObject)) else {
            // Registered by another copy of this library in the process
            return Class::get(DELEGATE_CLASS_NAME);
        };
        decl.add_ivar::<*mut c_void>(HANDLER_IVAR);
        if let Some(protocol) = Protocol::get("CBPeripheralManagerDelegate") {
            decl.add_protocol(protocol);
        }
        unsafe {
            decl.add_method(
                sel!(peripheralManagerDidUpdateState:),
                peripheral_manager_did_update_state as extern "C" fn(&Object, Sel, Id),
            );
        }
        Some(decl.register())
    })
}

// ----------------------------------------------------------------------------
// Platform
// ----------------------------------------------------------------------------

/// Core Bluetooth backend for macOS and iOS
#[derive(Debug, Default)]
pub struct CoreBluetoothPlatform;

impl CoreBluetoothPlatform {
    pub fn new() -> Self {
        Self
    }

    fn peripheral_manager_class() -> Option<&'static Class> {
        Class::get("CBPeripheralManager")
    }
}

impl BluetoothPlatform for CoreBluetoothPlatform {
    fn name(&self) -> &'static str {
        "corebluetooth"
    }

    fn authorization_api(&self) -> AuthorizationApi {
        unsafe {
            if let Some(manager_class) = Class::get("CBManager") {
                let responds: BOOL =
                    msg_send![manager_class, respondsToSelector: sel!(authorization)];
                if responds == YES {
                    return AuthorizationApi::AppWide;
                }
            }

            if let Some(peripheral_class) = Self::peripheral_manager_class() {
                let responds: BOOL = msg_send![peripheral_class,
                    instancesRespondToSelector: sel!(authorization)];
                if responds == YES {
                    return AuthorizationApi::ManagerScoped;
                }
            }
        }

        AuthorizationApi::Legacy
    }

    fn app_authorization(&self) -> ManagerAuthorization {
        match Class::get("CBManager") {
            Some(manager_class) => unsafe {
                let raw: isize = msg_send![manager_class, authorization];
                ManagerAuthorization::from_raw(raw as i64)
            },
            None => ManagerAuthorization::NotDetermined,
        }
    }

    fn manager_authorization(&self) -> ManagerAuthorization {
        let Some(peripheral_class) = Self::peripheral_manager_class() else {
            return ManagerAuthorization::NotDetermined;
        };

        unsafe {
            // A short-lived manager only to read its authorization
            let probe: Id = msg_send![peripheral_class, alloc];
            let probe: Id = msg_send![probe, init];
            if probe == NIL {
                return ManagerAuthorization::NotDetermined;
            }
            let raw: isize = msg_send![probe, authorization];
            let _: () = msg_send![probe, release];
            ManagerAuthorization::from_raw(raw as i64)
        }
    }

    fn legacy_authorization(&self) -> LegacyAuthorization {
        match Self::peripheral_manager_class() {
            Some(peripheral_class) => unsafe {
                let raw: isize = msg_send![peripheral_class, authorizationStatus];
                LegacyAuthorization::from_raw(raw as i64)
            },
            None => LegacyAuthorization::NotDetermined,
        }
    }

    fn create_manager(
        &self,
        options: &ManagerOptions,
        on_state_change: StateChangeHandler,
    ) -> PermissionResult<Box<dyn PeripheralManager>> {
        let peripheral_class = Self::peripheral_manager_class().ok_or_else(|| {
            PermissionError::manager_unavailable(
                "CBPeripheralManager class not available - Core Bluetooth framework missing",
            )
        })?;

        let delegate_class = delegate_class().ok_or_else(|| {
            PermissionError::manager_unavailable("Peripheral manager delegate class unavailable")
        })?;

        let handler = Box::into_raw(Box::new(on_state_change));

        unsafe {
            let delegate: Id = msg_send![delegate_class, alloc];
            let delegate: Id = msg_send![delegate, init];
            if delegate == NIL {
                drop(Box::from_raw(handler));
                return Err(PermissionError::manager_unavailable(
                    "Failed to create peripheral manager delegate",
                ));
            }
            (*delegate).set_ivar::<*mut c_void>(HANDLER_IVAR, handler as *mut c_void);

            let alert_key = NSString::from_str(SHOW_POWER_ALERT_KEY);
            let alert_flag: BOOL = if options.show_power_alert { YES } else { NO };
            let alert_value: Id = msg_send![class!(NSNumber), numberWithBool: alert_flag];
            let manager_options: Id = msg_send![class!(NSDictionary),
                dictionaryWithObject: alert_value
                forKey: &*alert_key
            ];

            let queue: Id = match options.delegate_queue {
                DelegateQueue::Main => NIL,
                DelegateQueue::Background => dispatch_get_global_queue(0, 0),
            };

            let manager: Id = msg_send![peripheral_class, alloc];
            let manager: Id = msg_send![manager,
                initWithDelegate: delegate
                queue: queue
                options: manager_options
            ];

            if manager == NIL {
                let _: () = msg_send![delegate, release];
                drop(Box::from_raw(handler));
                return Err(PermissionError::manager_unavailable(
                    "Failed to create CBPeripheralManager instance",
                ));
            }

            info!(
                "CBPeripheralManager initialized (power alert: {}, queue: {:?})",
                options.show_power_alert, options.delegate_queue
            );

            Ok(Box::new(CoreBluetoothManager {
                manager,
                delegate,
                handler,
            }))
        }
    }
}

// ----------------------------------------------------------------------------
// Manager
// ----------------------------------------------------------------------------

/// Owned `CBPeripheralManager` plus its delegate
pub struct CoreBluetoothManager {
    manager: Id,
    delegate: Id,
    handler: *mut StateChangeHandler,
}

// Core Bluetooth objects are thread-safe to message; ownership is exclusive.
unsafe impl Send for CoreBluetoothManager {}

unsafe impl Sync for CoreBluetoothManager {}

impl PeripheralManager for CoreBluetoothManager {
    fn state(&self) -> ManagerState {
        unsafe {
            let raw: isize = msg_send![self.manager, state];
            ManagerState::from_raw(raw as i64)
        }
    }

    fn start_advertising(&self) {
        unsafe {
            let _: () = msg_send![self.manager, startAdvertising: NIL];
        }
        debug!("Started empty advertisement");
    }

    fn stop_advertising(&self) {
        unsafe {
            let _: () = msg_send![self.manager, stopAdvertising];
        }
        debug!("Stopped advertisement");
    }
}

impl Drop for CoreBluetoothManager {
    fn drop(&mut self) {
        unsafe {
            let _: () = msg_send![self.manager, setDelegate: NIL];
            let _: () = msg_send![self.manager, release];
            (*self.delegate).set_ivar::<*mut c_void>(HANDLER_IVAR, std::ptr::null_mut());
            let _: () = msg_send![self.delegate, release];
            drop(Box::from_raw(self.handler));
        }
    }
}
