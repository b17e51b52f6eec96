// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Instance records and the per-instance `clap_plugin` vtable.
//!
//! An [`InstanceRecord`] starts with the [`RawPlugin`] the host sees, so the
//! plugin pointer the host passes back is the record pointer. The record is
//! boxed at creation and handed to the host as a raw pointer. Dropping the
//! reclaimed box tears the module instance down, so an owned record never
//! outlives its module instance.

use std::ffi::{CStr, c_char, c_void};
use std::ptr;
use std::sync::Arc;

use clapshim_core::abi::{CLAP_PROCESS_ERROR, RawHost, RawPlugin, RawProcess};
use clapshim_core::{CapabilitySet, ShimError};
use clapshim_module::{EntryPoints, Inst, ModuleHandle};
use tracing::{debug, warn};

use crate::dispatch;
use crate::lifecycle::{Call, Lifecycle, LifecycleState};
use crate::registry::PluginEntry;

/// Bridge-side state of one plugin instance.
#[repr(C)]
pub struct InstanceRecord {
    /// Must stay the first field.
    raw: RawPlugin,
    module_instance: Inst,
    lifecycle: Lifecycle,
    capabilities: CapabilitySet,
    entry_points: EntryPoints,
    module: Arc<ModuleHandle>,
    entry: Arc<PluginEntry>,
}

// SAFETY: the module instance pointer is written once at creation and the
// lifecycle is atomic; the module is responsible for its own threading.
unsafe impl Send for InstanceRecord {}
unsafe impl Sync for InstanceRecord {}

impl InstanceRecord {
    /// Construct a module instance for `entry`.
    ///
    /// Fails without leaving a record behind when the module constructor
    /// returns null.
    pub fn create(
        entry: Arc<PluginEntry>,
        module: Arc<ModuleHandle>,
        host: *const RawHost,
    ) -> Result<Box<InstanceRecord>, ShimError> {
        let entry_points = *module.entry_points();
        // SAFETY: the descriptor id is a valid C string owned by the entry,
        // which outlives this call.
        let module_instance =
            unsafe { (entry_points.plugin.create)(host, entry.descriptor().id().as_ptr()) };
        if module_instance.is_null() {
            return Err(ShimError::CreationFailed {
                plugin: entry.id().to_string(),
            });
        }

        let mut record = Box::new(InstanceRecord {
            raw: RawPlugin {
                desc: entry.descriptor().as_raw(),
                plugin_data: ptr::null_mut(),
                init: Some(plugin_init),
                destroy: Some(plugin_destroy),
                activate: Some(plugin_activate),
                deactivate: Some(plugin_deactivate),
                start_processing: Some(plugin_start_processing),
                stop_processing: Some(plugin_stop_processing),
                reset: Some(plugin_reset),
                process: Some(plugin_process),
                get_extension: Some(plugin_get_extension),
                on_main_thread: Some(plugin_on_main_thread),
            },
            module_instance,
            lifecycle: Lifecycle::default(),
            capabilities: module.capabilities(),
            entry_points,
            module,
            entry,
        });
        record.raw.plugin_data = ptr::addr_of_mut!(*record).cast::<c_void>();
        debug!(plugin = %record.entry.id(), capabilities = %record.capabilities, "instance created");
        Ok(record)
    }

    /// Hand ownership to the host.
    pub fn into_raw(record: Box<InstanceRecord>) -> *const RawPlugin {
        Box::into_raw(record).cast_const().cast::<RawPlugin>()
    }

    /// Borrow the record behind a host plugin pointer.
    ///
    /// # Safety
    ///
    /// `plugin` must be null or a pointer from [`InstanceRecord::into_raw`]
    /// that has not been destroyed.
    pub unsafe fn from_raw<'a>(plugin: *const RawPlugin) -> Option<&'a InstanceRecord> {
        // SAFETY: `raw` is the first field of a `repr(C)` record.
        unsafe { plugin.cast::<InstanceRecord>().as_ref() }
    }

    /// Take ownership back from the host.
    ///
    /// # Safety
    ///
    /// Same as [`InstanceRecord::from_raw`]; afterwards `plugin` is dangling.
    pub unsafe fn reclaim(plugin: *const RawPlugin) -> Option<Box<InstanceRecord>> {
        if plugin.is_null() {
            return None;
        }
        // SAFETY: forwarded to the caller.
        Some(unsafe { Box::from_raw(plugin.cast_mut().cast::<InstanceRecord>()) })
    }

    pub fn as_raw(&self) -> *const RawPlugin {
        &self.raw
    }

    pub fn plugin_id(&self) -> &str {
        self.entry.id()
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Capability map copied at creation.
    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    pub fn entry_points(&self) -> &EntryPoints {
        &self.entry_points
    }

    /// Handle shared with every other instance of the same plugin.
    pub fn module(&self) -> &Arc<ModuleHandle> {
        &self.module
    }

    /// The module-side instance pointer, `None` when null.
    pub fn module_instance(&self) -> Option<Inst> {
        (!self.module_instance.is_null()).then_some(self.module_instance)
    }

    /// Run a lifecycle call: validate, forward, commit on success.
    fn transition(&self, call: Call, forward: impl FnOnce(Inst) -> bool) -> Result<(), ShimError> {
        let next = self.lifecycle.check(call)?;
        let inst = self.module_instance().ok_or_else(|| {
            ShimError::Internal(format!("{} has no module instance", self.plugin_id()))
        })?;
        if !forward(inst) {
            return Err(ShimError::Internal(format!(
                "module rejected {call} for {}",
                self.plugin_id()
            )));
        }
        self.lifecycle.commit(next);
        Ok(())
    }

    pub fn init(&self) -> Result<(), ShimError> {
        let init = self.entry_points.plugin.init;
        // SAFETY: `inst` came from this module's constructor.
        self.transition(Call::Init, |inst| unsafe { init(inst) })
    }

    pub fn activate(
        &self,
        sample_rate: f64,
        min_frames: u32,
        max_frames: u32,
    ) -> Result<(), ShimError> {
        let activate = self.entry_points.plugin.activate;
        self.transition(Call::Activate, |inst| unsafe {
            activate(inst, sample_rate, min_frames, max_frames)
        })
    }

    pub fn deactivate(&self) -> Result<(), ShimError> {
        let deactivate = self.entry_points.plugin.deactivate;
        self.transition(Call::Deactivate, |inst| {
            unsafe { deactivate(inst) };
            true
        })
    }

    pub fn start_processing(&self) -> Result<(), ShimError> {
        let start = self.entry_points.plugin.start_processing;
        self.transition(Call::StartProcessing, |inst| unsafe { start(inst) })
    }

    pub fn stop_processing(&self) -> Result<(), ShimError> {
        let stop = self.entry_points.plugin.stop_processing;
        self.transition(Call::StopProcessing, |inst| {
            unsafe { stop(inst) };
            true
        })
    }

    pub fn reset(&self) -> Result<(), ShimError> {
        let reset = self.entry_points.plugin.reset;
        self.transition(Call::Reset, |inst| {
            unsafe { reset(inst) };
            true
        })
    }

    /// Forward one processing block.
    ///
    /// Runs on the audio thread: no allocation, no locking, no logging.
    pub fn process(&self, process: *const RawProcess) -> i32 {
        if !self.lifecycle.permits(Call::Process) || self.module_instance.is_null() {
            return CLAP_PROCESS_ERROR;
        }
        // SAFETY: `module_instance` came from this module's constructor and
        // `process` is the host's block for the duration of this call.
        unsafe { (self.entry_points.plugin.process)(self.module_instance, process) }
    }

    /// Extension table for `id`, or null when unsupported.
    pub fn extension(&self, id: &CStr) -> *const c_void {
        dispatch::extension_table(self.capabilities, id)
    }

    pub fn on_main_thread(&self) {
        if let (Some(main_thread), Some(inst)) = (self.entry_points.main_thread, self.module_instance())
        {
            // SAFETY: `inst` came from this module's constructor.
            unsafe { (main_thread.on_main_thread)(inst) };
        }
    }

    /// Tear the instance down from whatever state it is in.
    pub fn destroy(self: Box<Self>) {
        drop(self);
    }
}

impl Drop for InstanceRecord {
    fn drop(&mut self) {
        let Some(next) = Call::Destroy.target(self.state()) else {
            return;
        };
        self.lifecycle.commit(next);
        if let Some(inst) = self.module_instance() {
            // SAFETY: `inst` came from this module's constructor and is
            // never used again.
            unsafe { (self.entry_points.plugin.destroy)(inst) };
        }
        debug!(plugin = %self.plugin_id(), "instance destroyed");
    }
}

impl std::fmt::Debug for InstanceRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceRecord")
            .field("plugin", &self.plugin_id())
            .field("state", &self.state())
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

fn report(plugin: &InstanceRecord, result: Result<(), ShimError>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            warn!(plugin = %plugin.plugin_id(), state = %plugin.state(), error = %e, "lifecycle call failed");
            false
        }
    }
}

// Host-facing vtable. Each function tolerates a null plugin pointer.

unsafe extern "C" fn plugin_init(plugin: *const RawPlugin) -> bool {
    // SAFETY: the host passes back the pointer from `into_raw`.
    unsafe { InstanceRecord::from_raw(plugin) }.is_some_and(|record| report(record, record.init()))
}

unsafe extern "C" fn plugin_destroy(plugin: *const RawPlugin) {
    // SAFETY: the host calls destroy exactly once per instance.
    if let Some(record) = unsafe { InstanceRecord::reclaim(plugin) } {
        record.destroy();
    }
}

unsafe extern "C" fn plugin_activate(
    plugin: *const RawPlugin,
    sample_rate: f64,
    min_frames_count: u32,
    max_frames_count: u32,
) -> bool {
    unsafe { InstanceRecord::from_raw(plugin) }.is_some_and(|record| {
        report(
            record,
            record.activate(sample_rate, min_frames_count, max_frames_count),
        )
    })
}

unsafe extern "C" fn plugin_deactivate(plugin: *const RawPlugin) {
    if let Some(record) = unsafe { InstanceRecord::from_raw(plugin) } {
        report(record, record.deactivate());
    }
}

unsafe extern "C" fn plugin_start_processing(plugin: *const RawPlugin) -> bool {
    unsafe { InstanceRecord::from_raw(plugin) }
        .is_some_and(|record| report(record, record.start_processing()))
}

unsafe extern "C" fn plugin_stop_processing(plugin: *const RawPlugin) {
    if let Some(record) = unsafe { InstanceRecord::from_raw(plugin) } {
        report(record, record.stop_processing());
    }
}

unsafe extern "C" fn plugin_reset(plugin: *const RawPlugin) {
    if let Some(record) = unsafe { InstanceRecord::from_raw(plugin) } {
        report(record, record.reset());
    }
}

unsafe extern "C" fn plugin_process(plugin: *const RawPlugin, process: *const RawProcess) -> i32 {
    match unsafe { InstanceRecord::from_raw(plugin) } {
        Some(record) => record.process(process),
        None => CLAP_PROCESS_ERROR,
    }
}

unsafe extern "C" fn plugin_get_extension(
    plugin: *const RawPlugin,
    id: *const c_char,
) -> *const c_void {
    let Some(record) = (unsafe { InstanceRecord::from_raw(plugin) }) else {
        return ptr::null();
    };
    if id.is_null() {
        return ptr::null();
    }
    // SAFETY: the host passes a NUL-terminated extension id.
    record.extension(unsafe { CStr::from_ptr(id) })
}

unsafe extern "C" fn plugin_on_main_thread(plugin: *const RawPlugin) {
    if let Some(record) = unsafe { InstanceRecord::from_raw(plugin) } {
        record.on_main_thread();
    }
}
