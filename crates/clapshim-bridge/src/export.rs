// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The exported `clap_entry` symbol.
//!
//! Exactly one boxed [`Bridge`] lives here between `init` and `deinit`.
//! Errors are logged and collapsed into `false` or null; nothing unwinds
//! into the host.

use std::ffi::{CStr, OsStr, c_char, c_void};
use std::path::PathBuf;
use std::ptr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use clapshim_config::{ClapshimConfig, load_and_validate_for_bundle, to_shim_error};
use clapshim_core::abi::{CLAP_VERSION, RawPluginEntry};
use tracing::{error, info, warn};

use crate::bridge::Bridge;
use crate::logging::init_logging;

static BRIDGE: Mutex<Option<Box<Bridge>>> = Mutex::new(None);

/// Entry table the host looks up by name.
#[unsafe(no_mangle)]
#[allow(non_upper_case_globals)]
pub static clap_entry: RawPluginEntry = RawPluginEntry {
    clap_version: CLAP_VERSION,
    init: Some(entry_init),
    deinit: Some(entry_deinit),
    get_factory: Some(entry_get_factory),
};

fn slot() -> MutexGuard<'static, Option<Box<Bridge>>> {
    BRIDGE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Whether a bridge is currently installed.
pub fn is_initialized() -> bool {
    slot().is_some()
}

unsafe extern "C" fn entry_init(plugin_path: *const c_char) -> bool {
    if plugin_path.is_null() {
        return false;
    }
    // SAFETY: the host passes a NUL-terminated bundle path.
    let plugin_path = bundle_path(unsafe { CStr::from_ptr(plugin_path) });

    let mut slot = slot();
    if slot.is_some() {
        return true;
    }

    let bundle_dir = plugin_path.parent().map(PathBuf::from).unwrap_or_default();
    let (config, config_errors) = match load_and_validate_for_bundle(&bundle_dir) {
        Ok(config) => (config, None),
        Err(errors) => (ClapshimConfig::default(), Some(to_shim_error(&errors))),
    };
    init_logging(&config.logging);
    if let Some(e) = config_errors {
        warn!(error = %e, "invalid configuration, using defaults");
    }

    match Bridge::from_bundle(&plugin_path, &config) {
        Ok(bridge) => {
            info!(plugin_path = %plugin_path.display(), "clapshim initialized");
            *slot = Some(bridge);
            true
        }
        Err(e) => {
            error!(plugin_path = %plugin_path.display(), error = %e, "clapshim init failed");
            false
        }
    }
}

/// Host bundle path as a filesystem path, byte-exact where paths are bytes.
#[cfg(unix)]
fn bundle_path(raw: &CStr) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(OsStr::from_bytes(raw.to_bytes()))
}

#[cfg(not(unix))]
fn bundle_path(raw: &CStr) -> PathBuf {
    PathBuf::from(OsStr::new(raw.to_string_lossy().as_ref()))
}

unsafe extern "C" fn entry_deinit() {
    if slot().take().is_some() {
        info!("clapshim deinitialized");
    }
}

unsafe extern "C" fn entry_get_factory(factory_id: *const c_char) -> *const c_void {
    if factory_id.is_null() {
        return ptr::null();
    }
    // SAFETY: the host passes a NUL-terminated factory id.
    let id = unsafe { CStr::from_ptr(factory_id) };
    // The bridge is boxed, so the table stays put until deinit.
    slot().as_ref().map_or(ptr::null(), |bridge| bridge.factory(id))
}
