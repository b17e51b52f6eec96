// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A mock implementation module made of real `extern "C"` functions.
//!
//! The functions follow the `clapshim_<group>_<function>` convention and are
//! assembled into an [`ExportTable`], so the resolver sees exactly what it
//! would see in a shared library. Each instance records the calls it
//! receives; the host pointer passed at creation may be a [`MockHost`],
//! which counts constructions and destructions across instances.

use std::ffi::{CStr, c_char, c_void};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use clapshim_core::MODULE_API_VERSION;
use clapshim_core::abi::{
    CLAP_PROCESS_CONTINUE, RawHost, RawInputEvents, RawInputStream, RawOutputEvents,
    RawOutputStream, RawParamInfo, RawProcess,
};
use clapshim_module::{ExportTable, Inst, StaticUnit};

/// Stand-in for a host, passed to `create_plugin` as its host pointer.
#[derive(Debug, Default)]
pub struct MockHost {
    pub created: AtomicUsize,
    pub destroyed: AtomicUsize,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_raw(&self) -> *const RawHost {
        (self as *const MockHost).cast()
    }

    /// Instances created and not yet destroyed.
    pub fn live(&self) -> usize {
        self.created.load(Ordering::SeqCst) - self.destroyed.load(Ordering::SeqCst)
    }
}

/// Module-side state of one mock instance.
#[derive(Debug)]
pub struct MockInstance {
    pub plugin_id: String,
    host: *const MockHost,
    calls: Mutex<Vec<&'static str>>,
    gain: Mutex<f64>,
}

impl MockInstance {
    /// Borrow the instance behind a module instance pointer.
    ///
    /// # Safety
    ///
    /// `inst` must come from a mock constructor and still be alive.
    pub unsafe fn from_inst<'a>(inst: Inst) -> &'a MockInstance {
        // SAFETY: forwarded to the caller.
        unsafe { &*inst.cast::<MockInstance>() }
    }

    /// Calls received so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| **c == call).count()
    }

    fn record(&self, call: &'static str) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

/// # Safety
///
/// `inst` must be null or a live mock instance.
unsafe fn with_instance<R>(inst: Inst, neutral: R, f: impl FnOnce(&MockInstance) -> R) -> R {
    if inst.is_null() {
        return neutral;
    }
    // SAFETY: forwarded to the caller.
    f(unsafe { MockInstance::from_inst(inst) })
}

// Mandatory group.

unsafe extern "C" fn mock_create(host: *const RawHost, plugin_id: *const c_char) -> Inst {
    let plugin_id = if plugin_id.is_null() {
        String::new()
    } else {
        unsafe { CStr::from_ptr(plugin_id) }.to_string_lossy().into_owned()
    };
    let host = host.cast::<MockHost>();
    if let Some(host) = unsafe { host.as_ref() } {
        host.created.fetch_add(1, Ordering::SeqCst);
    }
    let instance = Box::new(MockInstance {
        plugin_id,
        host,
        calls: Mutex::new(vec!["create"]),
        gain: Mutex::new(1.0),
    });
    Box::into_raw(instance).cast()
}

unsafe extern "C" fn mock_create_null(_host: *const RawHost, _plugin_id: *const c_char) -> Inst {
    std::ptr::null_mut()
}

unsafe extern "C" fn mock_init(inst: Inst) -> bool {
    unsafe { with_instance(inst, (), |i| i.record("init")) };
    !inst.is_null()
}

unsafe extern "C" fn mock_init_failing(inst: Inst) -> bool {
    unsafe { with_instance(inst, (), |i| i.record("init")) };
    false
}

unsafe extern "C" fn mock_destroy(inst: Inst) {
    if inst.is_null() {
        return;
    }
    // SAFETY: the instance was boxed by `mock_create` and is freed once.
    let instance = unsafe { Box::from_raw(inst.cast::<MockInstance>()) };
    if let Some(host) = unsafe { instance.host.as_ref() } {
        host.destroyed.fetch_add(1, Ordering::SeqCst);
    }
}

unsafe extern "C" fn mock_activate(inst: Inst, _sample_rate: f64, _min: u32, _max: u32) -> bool {
    unsafe {
        with_instance(inst, false, |i| {
            i.record("activate");
            true
        })
    }
}

unsafe extern "C" fn mock_deactivate(inst: Inst) {
    unsafe { with_instance(inst, (), |i| i.record("deactivate")) }
}

unsafe extern "C" fn mock_start_processing(inst: Inst) -> bool {
    unsafe {
        with_instance(inst, false, |i| {
            i.record("start_processing");
            true
        })
    }
}

unsafe extern "C" fn mock_stop_processing(inst: Inst) {
    unsafe { with_instance(inst, (), |i| i.record("stop_processing")) }
}

unsafe extern "C" fn mock_reset(inst: Inst) {
    unsafe { with_instance(inst, (), |i| i.record("reset")) }
}

unsafe extern "C" fn mock_process(inst: Inst, _process: *const RawProcess) -> i32 {
    unsafe {
        with_instance(inst, 0, |i| {
            i.record("process");
            CLAP_PROCESS_CONTINUE
        })
    }
}

unsafe extern "C" fn mock_on_main_thread(inst: Inst) {
    unsafe { with_instance(inst, (), |i| i.record("on_main_thread")) }
}

unsafe extern "C" fn mock_version_compatible(major: *mut u32, minor: *mut u32, patch: *mut u32) -> bool {
    write_version(major, minor, patch, MODULE_API_VERSION.major as u32)
}

unsafe extern "C" fn mock_version_incompatible(major: *mut u32, minor: *mut u32, patch: *mut u32) -> bool {
    write_version(major, minor, patch, MODULE_API_VERSION.major as u32 + 1)
}

fn write_version(major: *mut u32, minor: *mut u32, patch: *mut u32, reported_major: u32) -> bool {
    if major.is_null() || minor.is_null() || patch.is_null() {
        return false;
    }
    // SAFETY: checked non-null; the resolver passes valid out-pointers.
    unsafe {
        *major = reported_major;
        *minor = MODULE_API_VERSION.minor as u32;
        *patch = 0;
    }
    true
}

// Params: a single "Gain" parameter with id 0.

unsafe extern "C" fn mock_params_count(inst: Inst) -> u32 {
    unsafe {
        with_instance(inst, 0, |i| {
            i.record("params_count");
            1
        })
    }
}

unsafe extern "C" fn mock_params_get_info(inst: Inst, index: u32, _info: *mut RawParamInfo) -> bool {
    unsafe {
        with_instance(inst, false, |i| {
            i.record("params_get_info");
            index == 0
        })
    }
}

unsafe extern "C" fn mock_params_get_value(inst: Inst, param_id: u32, out: *mut f64) -> bool {
    unsafe {
        with_instance(inst, false, |i| {
            i.record("params_get_value");
            if param_id != 0 || out.is_null() {
                return false;
            }
            *out = i.gain.lock().map(|g| *g).unwrap_or_default();
            true
        })
    }
}

unsafe extern "C" fn mock_params_value_to_text(
    inst: Inst,
    param_id: u32,
    value: f64,
    out: *mut c_char,
    capacity: u32,
) -> bool {
    unsafe {
        with_instance(inst, false, |i| {
            i.record("params_value_to_text");
            let text = format!("{value:.2}");
            if param_id != 0 || out.is_null() || text.len() >= capacity as usize {
                return false;
            }
            std::ptr::copy_nonoverlapping(text.as_ptr().cast::<c_char>(), out, text.len());
            *out.add(text.len()) = 0;
            true
        })
    }
}

unsafe extern "C" fn mock_params_text_to_value(
    inst: Inst,
    param_id: u32,
    text: *const c_char,
    out: *mut f64,
) -> bool {
    unsafe {
        with_instance(inst, false, |i| {
            i.record("params_text_to_value");
            if param_id != 0 || text.is_null() || out.is_null() {
                return false;
            }
            match CStr::from_ptr(text).to_str().ok().and_then(|t| t.trim().parse().ok()) {
                Some(value) => {
                    *out = value;
                    true
                }
                None => false,
            }
        })
    }
}

unsafe extern "C" fn mock_params_flush(
    inst: Inst,
    _input: *const RawInputEvents,
    _output: *const RawOutputEvents,
) {
    unsafe { with_instance(inst, (), |i| i.record("params_flush")) }
}

// State.

unsafe extern "C" fn mock_state_save(inst: Inst, _stream: *const RawOutputStream) -> bool {
    unsafe {
        with_instance(inst, false, |i| {
            i.record("state_save");
            true
        })
    }
}

unsafe extern "C" fn mock_state_load(inst: Inst, _stream: *const RawInputStream) -> bool {
    unsafe {
        with_instance(inst, false, |i| {
            i.record("state_load");
            true
        })
    }
}

// Latency.

unsafe extern "C" fn mock_latency_get(inst: Inst) -> u32 {
    unsafe {
        with_instance(inst, 0, |i| {
            i.record("latency_get");
            64
        })
    }
}

fn addr(f: *const ()) -> *const c_void {
    f.cast()
}

/// Builder for a mock module's export table.
///
/// Starts with the nine mandatory entry points; optional groups are added
/// whole, or in part to exercise partial-group handling.
#[derive(Debug, Clone)]
pub struct MockModule {
    table: ExportTable,
}

impl MockModule {
    /// A module exporting only the mandatory group.
    pub fn new(name: impl Into<String>) -> Self {
        let table = ExportTable::new(name)
            .with("clapshim_plugin_create", addr(mock_create as *const ()))
            .with("clapshim_plugin_init", addr(mock_init as *const ()))
            .with("clapshim_plugin_destroy", addr(mock_destroy as *const ()))
            .with("clapshim_plugin_activate", addr(mock_activate as *const ()))
            .with("clapshim_plugin_deactivate", addr(mock_deactivate as *const ()))
            .with("clapshim_plugin_start_processing", addr(mock_start_processing as *const ()))
            .with("clapshim_plugin_stop_processing", addr(mock_stop_processing as *const ()))
            .with("clapshim_plugin_reset", addr(mock_reset as *const ()))
            .with("clapshim_plugin_process", addr(mock_process as *const ()));
        Self { table }
    }

    pub fn with_params(self) -> Self {
        self.export("clapshim_params_count", mock_params_count as *const ())
            .export("clapshim_params_get_info", mock_params_get_info as *const ())
            .export("clapshim_params_get_value", mock_params_get_value as *const ())
            .export("clapshim_params_value_to_text", mock_params_value_to_text as *const ())
            .export("clapshim_params_text_to_value", mock_params_text_to_value as *const ())
            .export("clapshim_params_flush", mock_params_flush as *const ())
    }

    pub fn with_state(self) -> Self {
        self.export("clapshim_state_save", mock_state_save as *const ())
            .export("clapshim_state_load", mock_state_load as *const ())
    }

    /// Only `clapshim_state_save`: the state group stays unresolved.
    pub fn with_partial_state(self) -> Self {
        self.export("clapshim_state_save", mock_state_save as *const ())
    }

    pub fn with_latency(self) -> Self {
        self.export("clapshim_latency_get", mock_latency_get as *const ())
    }

    pub fn with_main_thread(self) -> Self {
        self.export("clapshim_plugin_on_main_thread", mock_on_main_thread as *const ())
    }

    /// Export a version probe reporting the bridge's API major.
    pub fn with_compatible_version(self) -> Self {
        self.export("clapshim_get_version", mock_version_compatible as *const ())
    }

    /// Export a version probe reporting a newer API major.
    pub fn with_incompatible_version(self) -> Self {
        self.export("clapshim_get_version", mock_version_incompatible as *const ())
    }

    /// Replace `init` with one that always fails.
    pub fn with_failing_init(self) -> Self {
        self.export("clapshim_plugin_init", mock_init_failing as *const ())
    }

    /// Replace the constructor with one that returns null.
    pub fn with_null_constructor(self) -> Self {
        self.export("clapshim_plugin_create", mock_create_null as *const ())
    }

    /// Remove one export, e.g. a mandatory entry point.
    pub fn without(self, symbol: &str) -> Self {
        Self {
            table: self.table.without(symbol),
        }
    }

    fn export(mut self, symbol: &str, f: *const ()) -> Self {
        self.table.export(symbol, addr(f));
        self
    }

    pub fn exports(&self) -> &ExportTable {
        &self.table
    }

    pub fn into_exports(self) -> ExportTable {
        self.table
    }

    /// A static unit resolved by name, exactly like a shared library.
    pub fn into_unit(self) -> StaticUnit {
        StaticUnit::Exports(Arc::new(self.table))
    }
}
