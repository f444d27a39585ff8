//! macOS implementation of the monitor providers.

use crate::enforcement::BlockRequest;
use crate::provider::{BlockingSurface, ProviderError, RunningTaskSource, UsageEventSource};
use crate::state::UsageEvent;
use kiosk_whitelist::PackageId;
use std::ffi::CString;

// Native Cocoa imports for frontmost app detection
use objc::runtime::{Class, Object};
use objc::{msg_send, sel, sel_impl};

/// `NSApplicationActivateIgnoringOtherApps`
const ACTIVATE_IGNORING_OTHER_APPS: usize = 1 << 1;

/// Bundle id brought to the front after a block.
pub const DEFAULT_HOME_BUNDLE_ID: &str = "com.apple.finder";

/// System surfaces that take focus on their own (Dock, menu bar extras,
/// login and lock screen).
pub const MACOS_SYSTEM_BUNDLE_IDS: &[&str] = &[
    "com.apple.dock",
    "com.apple.loginwindow",
    "com.apple.systemuiserver",
];

/// macOS implementation using native Cocoa APIs.
///
/// macOS has no usage-event log, so detection always goes through the
/// running-task fallback (`NSWorkspace.frontmostApplication`). Blocking hides
/// the denied app and activates the home app.
#[derive(Debug)]
pub struct MacOSProvider {
    home_bundle_id: String,
}

impl Default for MacOSProvider {
    fn default() -> Self {
        Self {
            home_bundle_id: DEFAULT_HOME_BUNDLE_ID.to_string(),
        }
    }
}

impl MacOSProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_home(home_bundle_id: impl Into<String>) -> Self {
        Self {
            home_bundle_id: home_bundle_id.into(),
        }
    }

    pub fn home_bundle_id(&self) -> &str {
        &self.home_bundle_id
    }
}

impl UsageEventSource for MacOSProvider {
    fn query_events(&self, _start_ms: i64, _end_ms: i64) -> Result<Vec<UsageEvent>, ProviderError> {
        Ok(Vec::new())
    }
}

impl RunningTaskSource for MacOSProvider {
    fn top_task_package(&self) -> Result<Option<PackageId>, ProviderError> {
        Ok(get_frontmost_bundle_id().map(PackageId::from))
    }
}

impl BlockingSurface for MacOSProvider {
    fn present(&self, request: &BlockRequest) -> Result<(), ProviderError> {
        let hidden = unsafe { hide_app(request.package.as_str()) };
        if hidden == 0 {
            return Err(ProviderError::Platform(format!(
                "no running application for {}",
                request.package
            )));
        }

        if !unsafe { activate_app(&self.home_bundle_id) } {
            tracing::warn!(home = %self.home_bundle_id, "home app not running, blocked app hidden only");
        }
        Ok(())
    }

    fn home_packages(&self) -> Vec<PackageId> {
        std::iter::once(self.home_bundle_id.as_str())
            .chain(MACOS_SYSTEM_BUNDLE_IDS.iter().copied())
            .map(PackageId::from)
            .collect()
    }
}

/// Get the frontmost application's bundle id using native Cocoa APIs.
///
/// Uses NSWorkspace.sharedWorkspace.frontmostApplication for efficiency.
fn get_frontmost_bundle_id() -> Option<String> {
    unsafe {
        let workspace_class = Class::get("NSWorkspace")?;

        let shared_workspace: *mut Object = msg_send![workspace_class, sharedWorkspace];
        if shared_workspace.is_null() {
            return None;
        }

        let frontmost_app: *mut Object = msg_send![shared_workspace, frontmostApplication];
        if frontmost_app.is_null() {
            return None;
        }

        let bundle_id_ns: *mut Object = msg_send![frontmost_app, bundleIdentifier];
        let bundle_id = nsstring_to_string(bundle_id_ns)?;

        if bundle_id.is_empty() {
            return None;
        }
        Some(bundle_id)
    }
}

/// `[NSRunningApplication runningApplicationsWithBundleIdentifier:]`
unsafe fn running_apps(bundle_id: &str) -> Option<*mut Object> {
    let class = Class::get("NSRunningApplication")?;
    let ns_id = nsstring_from_str(bundle_id)?;
    let apps: *mut Object = msg_send![class, runningApplicationsWithBundleIdentifier: ns_id];
    if apps.is_null() {
        return None;
    }
    Some(apps)
}

/// Hide every instance of `bundle_id`. Returns how many were found.
unsafe fn hide_app(bundle_id: &str) -> usize {
    let Some(apps) = running_apps(bundle_id) else {
        return 0;
    };
    let count: usize = msg_send![apps, count];
    for i in 0..count {
        let app: *mut Object = msg_send![apps, objectAtIndex: i];
        if !app.is_null() {
            let _: objc::runtime::BOOL = msg_send![app, hide];
        }
    }
    count
}

unsafe fn activate_app(bundle_id: &str) -> bool {
    let Some(apps) = running_apps(bundle_id) else {
        return false;
    };
    let count: usize = msg_send![apps, count];
    if count == 0 {
        return false;
    }
    let app: *mut Object = msg_send![apps, objectAtIndex: 0usize];
    if app.is_null() {
        return false;
    }
    let _: objc::runtime::BOOL = msg_send![app, activateWithOptions: ACTIVATE_IGNORING_OTHER_APPS];
    true
}

unsafe fn nsstring_from_str(s: &str) -> Option<*mut Object> {
    let class = Class::get("NSString")?;
    let c_string = CString::new(s).ok()?;
    let ns: *mut Object = msg_send![class, stringWithUTF8String: c_string.as_ptr()];
    if ns.is_null() {
        return None;
    }
    Some(ns)
}

/// Convert NSString to Rust String.
unsafe fn nsstring_to_string(nsstring: *mut Object) -> Option<String> {
    if nsstring.is_null() {
        return None;
    }

    let c_str: *const std::os::raw::c_char = msg_send![nsstring, UTF8String];
    if c_str.is_null() {
        return None;
    }

    let rust_str = std::ffi::CStr::from_ptr(c_str).to_str().ok()?;
    Some(rust_str.to_string())
}
