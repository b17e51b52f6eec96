// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability dispatcher.
//!
//! `get_extension` answers from the instance's capability map alone. A
//! supported extension gets a static table of thin forwarders; each one
//! recovers the instance record from the plugin pointer, picks the module's
//! group, and calls it with the module-side instance pointer and the host's
//! arguments unchanged. A null plugin or module pointer yields the
//! neutral value (`false`, `0`, nothing).
//!
//! Audio ports are owned by the bridge: one stereo input and one stereo
//! output, always available.

use std::ffi::{CStr, c_char, c_void};
use std::ptr;

use clapshim_core::abi::*;
use clapshim_core::{CapabilitySet, Extension};
use clapshim_module::Inst;
use clapshim_module::ExtensionEntryPoints;

use crate::instance::InstanceRecord;

/// Table for extension `id` on an instance with `capabilities`.
pub fn extension_table(capabilities: CapabilitySet, id: &CStr) -> *const c_void {
    if id == CLAP_EXT_AUDIO_PORTS {
        return table(&AUDIO_PORTS);
    }
    match Extension::from_id(id) {
        Some(ext) if capabilities.contains(ext) => forwarders(ext),
        _ => ptr::null(),
    }
}

/// Forwarder table for `ext`, regardless of capability.
pub fn forwarders(ext: Extension) -> *const c_void {
    match ext {
        Extension::Params => table(&PARAMS),
        Extension::State => table(&STATE),
        Extension::StateContext => table(&STATE_CONTEXT),
        Extension::NotePorts => table(&NOTE_PORTS),
        Extension::Latency => table(&LATENCY),
        Extension::Tail => table(&TAIL),
        Extension::TimerSupport => table(&TIMER_SUPPORT),
        Extension::AudioPortsConfig => table(&AUDIO_PORTS_CONFIG),
        Extension::AudioPortsConfigInfo => table(&AUDIO_PORTS_CONFIG_INFO),
        Extension::Surround => table(&SURROUND),
        Extension::VoiceInfo => table(&VOICE_INFO),
        Extension::PresetLoad => table(&PRESET_LOAD),
        Extension::TrackInfo => table(&TRACK_INFO),
        Extension::ParamIndication => table(&PARAM_INDICATION),
        Extension::ContextMenu => table(&CONTEXT_MENU),
        Extension::RemoteControls => table(&REMOTE_CONTROLS),
        Extension::NoteName => table(&NOTE_NAME),
        Extension::Ambisonic => table(&AMBISONIC),
        Extension::AudioPortsActivation => table(&AUDIO_PORTS_ACTIVATION),
        Extension::ConfigurableAudioPorts => table(&CONFIGURABLE_AUDIO_PORTS),
        Extension::Render => table(&RENDER),
        Extension::ThreadPool => table(&THREAD_POOL),
        Extension::PosixFdSupport => table(&POSIX_FD_SUPPORT),
        Extension::Tuning => table(&TUNING),
        Extension::Gui => table(&GUI),
    }
}

fn table<T>(table: &'static T) -> *const c_void {
    (table as *const T).cast()
}

/// Module group and instance pointer behind a host plugin pointer.
fn target<G>(
    plugin: *const RawPlugin,
    pick: impl FnOnce(&ExtensionEntryPoints) -> Option<G>,
) -> Option<(G, Inst)> {
    // SAFETY: hosts only pass plugin pointers this bridge handed out.
    let record = unsafe { InstanceRecord::from_raw(plugin) }?;
    let inst = record.module_instance()?;
    Some((pick(&record.entry_points().extensions)?, inst))
}

macro_rules! forwarder {
    ($name:ident => $group:ident . $func:ident ( $($arg:ident : $ty:ty),* ) -> $ret:ty, or $neutral:expr) => {
        unsafe extern "C" fn $name(plugin: *const RawPlugin $(, $arg: $ty)*) -> $ret {
            match target(plugin, |ext| ext.$group) {
                // SAFETY: arguments pass through unchanged to the module
                // function registered for this exact signature.
                Some((group, inst)) => unsafe { (group.$func)(inst $(, $arg)*) },
                None => $neutral,
            }
        }
    };
    ($name:ident => $group:ident . $func:ident ( $($arg:ident : $ty:ty),* )) => {
        unsafe extern "C" fn $name(plugin: *const RawPlugin $(, $arg: $ty)*) {
            if let Some((group, inst)) = target(plugin, |ext| ext.$group) {
                // SAFETY: as above.
                unsafe { (group.$func)(inst $(, $arg)*) }
            }
        }
    };
}

// params
forwarder!(params_count => params.count() -> u32, or 0);
forwarder!(params_get_info => params.get_info(index: u32, info: *mut RawParamInfo) -> bool, or false);
forwarder!(params_get_value => params.get_value(param_id: u32, out: *mut f64) -> bool, or false);
forwarder!(params_value_to_text => params.value_to_text(param_id: u32, value: f64, out: *mut c_char, capacity: u32) -> bool, or false);
forwarder!(params_text_to_value => params.text_to_value(param_id: u32, text: *const c_char, out: *mut f64) -> bool, or false);
forwarder!(params_flush => params.flush(input: *const RawInputEvents, output: *const RawOutputEvents));

static PARAMS: ClapPluginParams = ClapPluginParams {
    count: Some(params_count),
    get_info: Some(params_get_info),
    get_value: Some(params_get_value),
    value_to_text: Some(params_value_to_text),
    text_to_value: Some(params_text_to_value),
    flush: Some(params_flush),
};

// state
forwarder!(state_save => state.save(stream: *const RawOutputStream) -> bool, or false);
forwarder!(state_load => state.load(stream: *const RawInputStream) -> bool, or false);

static STATE: ClapPluginState = ClapPluginState {
    save: Some(state_save),
    load: Some(state_load),
};

forwarder!(state_context_save => state_context.save(stream: *const RawOutputStream, context_type: u32) -> bool, or false);
forwarder!(state_context_load => state_context.load(stream: *const RawInputStream, context_type: u32) -> bool, or false);

static STATE_CONTEXT: ClapPluginStateContext = ClapPluginStateContext {
    save: Some(state_context_save),
    load: Some(state_context_load),
};

forwarder!(note_ports_count => note_ports.count(is_input: bool) -> u32, or 0);
forwarder!(note_ports_get => note_ports.get(index: u32, is_input: bool, info: *mut RawNotePortInfo) -> bool, or false);

static NOTE_PORTS: ClapPluginNotePorts = ClapPluginNotePorts {
    count: Some(note_ports_count),
    get: Some(note_ports_get),
};

forwarder!(latency_get => latency.get() -> u32, or 0);

static LATENCY: ClapPluginLatency = ClapPluginLatency {
    get: Some(latency_get),
};

forwarder!(tail_get => tail.get() -> u32, or 0);

static TAIL: ClapPluginTail = ClapPluginTail {
    get: Some(tail_get),
};

forwarder!(timer_on_timer => timer_support.on_timer(timer_id: u32));

static TIMER_SUPPORT: ClapPluginTimerSupport = ClapPluginTimerSupport {
    on_timer: Some(timer_on_timer),
};

forwarder!(audio_ports_config_count => audio_ports_config.count() -> u32, or 0);
forwarder!(audio_ports_config_get => audio_ports_config.get(index: u32, config: *mut RawAudioPortsConfig) -> bool, or false);
forwarder!(audio_ports_config_select => audio_ports_config.select(config_id: u32) -> bool, or false);

static AUDIO_PORTS_CONFIG: ClapPluginAudioPortsConfig = ClapPluginAudioPortsConfig {
    count: Some(audio_ports_config_count),
    get: Some(audio_ports_config_get),
    select: Some(audio_ports_config_select),
};

forwarder!(audio_ports_config_info_current => audio_ports_config_info.current_config() -> u32, or CLAP_INVALID_ID);
forwarder!(audio_ports_config_info_get => audio_ports_config_info.get(config_id: u32, port_index: u32, is_input: bool, info: *mut RawAudioPortInfo) -> bool, or false);

static AUDIO_PORTS_CONFIG_INFO: ClapPluginAudioPortsConfigInfo = ClapPluginAudioPortsConfigInfo {
    current_config: Some(audio_ports_config_info_current),
    get: Some(audio_ports_config_info_get),
};

forwarder!(surround_is_channel_mask_supported => surround.is_channel_mask_supported(channel_mask: u64) -> bool, or false);
forwarder!(surround_get_channel_map => surround.get_channel_map(is_input: bool, port_index: u32, channel_map: *mut u8, capacity: u32) -> u32, or 0);

static SURROUND: ClapPluginSurround = ClapPluginSurround {
    is_channel_mask_supported: Some(surround_is_channel_mask_supported),
    get_channel_map: Some(surround_get_channel_map),
};

forwarder!(voice_info_get => voice_info.get(info: *mut RawVoiceInfo) -> bool, or false);

static VOICE_INFO: ClapPluginVoiceInfo = ClapPluginVoiceInfo {
    get: Some(voice_info_get),
};

forwarder!(preset_load_from_location => preset_load.from_location(location_kind: u32, location: *const c_char, load_key: *const c_char) -> bool, or false);

static PRESET_LOAD: ClapPluginPresetLoad = ClapPluginPresetLoad {
    from_location: Some(preset_load_from_location),
};

forwarder!(track_info_changed => track_info.changed());

static TRACK_INFO: ClapPluginTrackInfo = ClapPluginTrackInfo {
    changed: Some(track_info_changed),
};

forwarder!(param_indication_set_mapping => param_indication.set_mapping(param_id: u32, has_mapping: bool, color: *const RawColor, label: *const c_char, description: *const c_char));
forwarder!(param_indication_set_automation => param_indication.set_automation(param_id: u32, automation_state: u32, color: *const RawColor));

static PARAM_INDICATION: ClapPluginParamIndication = ClapPluginParamIndication {
    set_mapping: Some(param_indication_set_mapping),
    set_automation: Some(param_indication_set_automation),
};

forwarder!(context_menu_populate => context_menu.populate(menu_target: *const RawContextMenuTarget, builder: *const RawContextMenuBuilder) -> bool, or false);
forwarder!(context_menu_perform => context_menu.perform(menu_target: *const RawContextMenuTarget, action_id: u32) -> bool, or false);

static CONTEXT_MENU: ClapPluginContextMenu = ClapPluginContextMenu {
    populate: Some(context_menu_populate),
    perform: Some(context_menu_perform),
};

forwarder!(remote_controls_count => remote_controls.count() -> u32, or 0);
forwarder!(remote_controls_get => remote_controls.get(page_index: u32, page: *mut RawRemoteControlsPage) -> bool, or false);

static REMOTE_CONTROLS: ClapPluginRemoteControls = ClapPluginRemoteControls {
    count: Some(remote_controls_count),
    get: Some(remote_controls_get),
};

forwarder!(note_name_count => note_name.count() -> u32, or 0);
forwarder!(note_name_get => note_name.get(index: u32, note_name: *mut RawNoteName) -> bool, or false);

static NOTE_NAME: ClapPluginNoteName = ClapPluginNoteName {
    count: Some(note_name_count),
    get: Some(note_name_get),
};

forwarder!(ambisonic_is_config_supported => ambisonic.is_config_supported(config: *const RawAmbisonicConfig) -> bool, or false);
forwarder!(ambisonic_get_config => ambisonic.get_config(is_input: bool, port_index: u32, config: *mut RawAmbisonicConfig) -> bool, or false);

static AMBISONIC: ClapPluginAmbisonic = ClapPluginAmbisonic {
    is_config_supported: Some(ambisonic_is_config_supported),
    get_config: Some(ambisonic_get_config),
};

forwarder!(audio_ports_activation_can_activate => audio_ports_activation.can_activate_while_processing() -> bool, or false);
forwarder!(audio_ports_activation_set_active => audio_ports_activation.set_active(is_input: bool, port_index: u32, is_active: bool, sample_size: u32) -> bool, or false);

static AUDIO_PORTS_ACTIVATION: ClapPluginAudioPortsActivation = ClapPluginAudioPortsActivation {
    can_activate_while_processing: Some(audio_ports_activation_can_activate),
    set_active: Some(audio_ports_activation_set_active),
};

forwarder!(configurable_audio_ports_can_apply => configurable_audio_ports.can_apply_configuration(requests: *const RawAudioPortConfigurationRequest, request_count: u32) -> bool, or false);
forwarder!(configurable_audio_ports_apply => configurable_audio_ports.apply_configuration(requests: *const RawAudioPortConfigurationRequest, request_count: u32) -> bool, or false);

static CONFIGURABLE_AUDIO_PORTS: ClapPluginConfigurableAudioPorts = ClapPluginConfigurableAudioPorts {
    can_apply_configuration: Some(configurable_audio_ports_can_apply),
    apply_configuration: Some(configurable_audio_ports_apply),
};

forwarder!(render_has_hard_realtime_requirement => render.has_hard_realtime_requirement() -> bool, or false);
forwarder!(render_set => render.set(mode: i32) -> bool, or false);

static RENDER: ClapPluginRender = ClapPluginRender {
    has_hard_realtime_requirement: Some(render_has_hard_realtime_requirement),
    set: Some(render_set),
};

forwarder!(thread_pool_exec => thread_pool.exec(task_index: u32));

static THREAD_POOL: ClapPluginThreadPool = ClapPluginThreadPool {
    exec: Some(thread_pool_exec),
};

forwarder!(posix_fd_on_fd => posix_fd_support.on_fd(fd: i32, flags: u32));

static POSIX_FD_SUPPORT: ClapPluginPosixFdSupport = ClapPluginPosixFdSupport {
    on_fd: Some(posix_fd_on_fd),
};

forwarder!(tuning_changed => tuning.changed());

static TUNING: ClapPluginTuning = ClapPluginTuning {
    changed: Some(tuning_changed),
};

// gui
forwarder!(gui_is_api_supported => gui.is_api_supported(api: *const c_char, is_floating: bool) -> bool, or false);
forwarder!(gui_get_preferred_api => gui.get_preferred_api(api: *mut *const c_char, is_floating: *mut bool) -> bool, or false);
forwarder!(gui_create => gui.create(api: *const c_char, is_floating: bool) -> bool, or false);
forwarder!(gui_destroy => gui.destroy());
forwarder!(gui_set_scale => gui.set_scale(scale: f64) -> bool, or false);
forwarder!(gui_get_size => gui.get_size(width: *mut u32, height: *mut u32) -> bool, or false);
forwarder!(gui_can_resize => gui.can_resize() -> bool, or false);
forwarder!(gui_get_resize_hints => gui.get_resize_hints(hints: *mut RawGuiResizeHints) -> bool, or false);
forwarder!(gui_adjust_size => gui.adjust_size(width: *mut u32, height: *mut u32) -> bool, or false);
forwarder!(gui_set_size => gui.set_size(width: u32, height: u32) -> bool, or false);
forwarder!(gui_set_parent => gui.set_parent(window: *const RawWindow) -> bool, or false);
forwarder!(gui_set_transient => gui.set_transient(window: *const RawWindow) -> bool, or false);
forwarder!(gui_suggest_title => gui.suggest_title(title: *const c_char));
forwarder!(gui_show => gui.show() -> bool, or false);
forwarder!(gui_hide => gui.hide() -> bool, or false);

static GUI: ClapPluginGui = ClapPluginGui {
    is_api_supported: Some(gui_is_api_supported),
    get_preferred_api: Some(gui_get_preferred_api),
    create: Some(gui_create),
    destroy: Some(gui_destroy),
    set_scale: Some(gui_set_scale),
    get_size: Some(gui_get_size),
    can_resize: Some(gui_can_resize),
    get_resize_hints: Some(gui_get_resize_hints),
    adjust_size: Some(gui_adjust_size),
    set_size: Some(gui_set_size),
    set_parent: Some(gui_set_parent),
    set_transient: Some(gui_set_transient),
    suggest_title: Some(gui_suggest_title),
    show: Some(gui_show),
    hide: Some(gui_hide),
};

// Built-in audio ports.

const STEREO_CHANNELS: u32 = 2;

unsafe extern "C" fn audio_ports_count(plugin: *const RawPlugin, _is_input: bool) -> u32 {
    if plugin.is_null() { 0 } else { 1 }
}

unsafe extern "C" fn audio_ports_get(
    plugin: *const RawPlugin,
    index: u32,
    is_input: bool,
    info: *mut RawAudioPortInfo,
) -> bool {
    if plugin.is_null() || index > 0 {
        return false;
    }
    // SAFETY: the host passes a writable port info or null.
    let Some(info) = (unsafe { info.as_mut() }) else {
        return false;
    };
    info.id = 0;
    write_name(&mut info.name, if is_input { "Stereo In" } else { "Stereo Out" });
    info.flags = CLAP_AUDIO_PORT_IS_MAIN;
    info.channel_count = STEREO_CHANNELS;
    info.port_type = CLAP_PORT_STEREO.as_ptr();
    info.in_place_pair = CLAP_INVALID_ID;
    true
}

static AUDIO_PORTS: ClapPluginAudioPorts = ClapPluginAudioPorts {
    count: Some(audio_ports_count),
    get: Some(audio_ports_get),
};
