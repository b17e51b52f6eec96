// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A minimal implementation module built as a shared library by the
//! dynamic loading tests: the mandatory group, params, latency, and the
//! version probe. Compiled standalone with `rustc --crate-type cdylib`.

use std::ffi::{c_char, c_void};

type Inst = *mut c_void;

/// Gain value stored per instance.
struct Instance {
    gain: f64,
}

#[no_mangle]
pub unsafe extern "C" fn clapshim_get_version(major: *mut u32, minor: *mut u32, patch: *mut u32) -> bool {
    if major.is_null() || minor.is_null() || patch.is_null() {
        return false;
    }
    *major = env!("FIXTURE_API_MAJOR").parse().unwrap_or(u32::MAX);
    *minor = 0;
    *patch = 0;
    true
}

#[no_mangle]
pub unsafe extern "C" fn clapshim_plugin_create(_host: *const c_void, _plugin_id: *const c_char) -> Inst {
    Box::into_raw(Box::new(Instance { gain: 0.5 })).cast()
}

#[no_mangle]
pub unsafe extern "C" fn clapshim_plugin_init(inst: Inst) -> bool {
    !inst.is_null()
}

#[no_mangle]
pub unsafe extern "C" fn clapshim_plugin_destroy(inst: Inst) {
    if !inst.is_null() {
        drop(Box::from_raw(inst.cast::<Instance>()));
    }
}

#[no_mangle]
pub unsafe extern "C" fn clapshim_plugin_activate(inst: Inst, _rate: f64, _min: u32, _max: u32) -> bool {
    !inst.is_null()
}

#[no_mangle]
pub unsafe extern "C" fn clapshim_plugin_deactivate(_inst: Inst) {}

#[no_mangle]
pub unsafe extern "C" fn clapshim_plugin_start_processing(inst: Inst) -> bool {
    !inst.is_null()
}

#[no_mangle]
pub unsafe extern "C" fn clapshim_plugin_stop_processing(_inst: Inst) {}

#[no_mangle]
pub unsafe extern "C" fn clapshim_plugin_reset(_inst: Inst) {}

#[no_mangle]
pub unsafe extern "C" fn clapshim_plugin_process(_inst: Inst, _process: *const c_void) -> i32 {
    1
}

#[no_mangle]
pub unsafe extern "C" fn clapshim_params_count(_inst: Inst) -> u32 {
    1
}

#[no_mangle]
pub unsafe extern "C" fn clapshim_params_get_info(_inst: Inst, index: u32, _info: *mut c_void) -> bool {
    index == 0
}

#[no_mangle]
pub unsafe extern "C" fn clapshim_params_get_value(inst: Inst, param_id: u32, out: *mut f64) -> bool {
    if inst.is_null() || out.is_null() || param_id != 0 {
        return false;
    }
    *out = (*inst.cast::<Instance>()).gain;
    true
}

#[no_mangle]
pub unsafe extern "C" fn clapshim_params_value_to_text(
    _inst: Inst,
    _param_id: u32,
    _value: f64,
    _out: *mut c_char,
    _capacity: u32,
) -> bool {
    false
}

#[no_mangle]
pub unsafe extern "C" fn clapshim_params_text_to_value(
    _inst: Inst,
    _param_id: u32,
    _text: *const c_char,
    _out: *mut f64,
) -> bool {
    false
}

#[no_mangle]
pub unsafe extern "C" fn clapshim_params_flush(_inst: Inst, _input: *const c_void, _output: *const c_void) {}

#[no_mangle]
pub unsafe extern "C" fn clapshim_latency_get(_inst: Inst) -> u32 {
    256
}
