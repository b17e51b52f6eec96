// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `#[repr(C)]` mirror of the CLAP plugin ABI surface the bridge exposes.
//!
//! Only the structures the bridge itself reads or fills are given real
//! layouts (versions, descriptors, the plugin vtable, factories, the entry
//! table, and audio port info). Everything the bridge merely passes through
//! to the module (events, streams, param info, GUI windows, ...) is an
//! opaque type: the forwarders never look inside.

use std::ffi::{CStr, c_char, c_void};
use std::marker::{PhantomData, PhantomPinned};

/// Protocol version triple.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClapVersion {
    pub major: u32,
    pub minor: u32,
    pub revision: u32,
}

/// Protocol version advertised in descriptors and the entry table.
pub const CLAP_VERSION: ClapVersion = ClapVersion {
    major: 1,
    minor: 2,
    revision: 2,
};

/// Sentinel for "no id" in `clap_id` fields.
pub const CLAP_INVALID_ID: u32 = u32::MAX;

/// Size of fixed name buffers (`CLAP_NAME_SIZE`).
pub const CLAP_NAME_SIZE: usize = 256;

/// `clap_process_status` values.
pub const CLAP_PROCESS_ERROR: i32 = 0;
pub const CLAP_PROCESS_CONTINUE: i32 = 1;
pub const CLAP_PROCESS_CONTINUE_IF_NOT_QUIET: i32 = 2;
pub const CLAP_PROCESS_TAIL: i32 = 3;
pub const CLAP_PROCESS_SLEEP: i32 = 4;

/// Audio port flag: this is the main port of its direction.
pub const CLAP_AUDIO_PORT_IS_MAIN: u32 = 1 << 0;

/// Port type string for two-channel ports.
pub const CLAP_PORT_STEREO: &CStr = c"stereo";

/// Factory ids the entry point knows how to route.
pub const CLAP_PLUGIN_FACTORY_ID: &CStr = c"clap.plugin-factory";
pub const CLAP_PRESET_DISCOVERY_FACTORY_ID: &CStr = c"clap.preset-discovery-factory/2";
pub const CLAP_PRESET_DISCOVERY_FACTORY_ID_COMPAT: &CStr =
    c"clap.preset-discovery-factory/draft-2";
pub const CLAP_PLUGIN_STATE_CONVERTER_FACTORY_ID: &CStr =
    c"clap.plugin-state-converter-factory/1";
pub const CLAP_PLUGIN_INVALIDATION_FACTORY_ID: &CStr = c"clap.plugin-invalidation-factory/1";

/// Extension id of the bridge-owned audio port enumeration.
pub const CLAP_EXT_AUDIO_PORTS: &CStr = c"clap.audio-ports";

macro_rules! opaque {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[repr(C)]
            pub struct $name {
                _data: [u8; 0],
                _marker: PhantomData<(*mut u8, PhantomPinned)>,
            }
        )*
    };
}

opaque!(
    /// `clap_host_t`, owned by the host.
    RawHost,
    /// `clap_process_t`, valid for the duration of one `process` call.
    RawProcess,
    RawInputEvents,
    RawOutputEvents,
    RawInputStream,
    RawOutputStream,
    RawParamInfo,
    RawNotePortInfo,
    RawAudioPortsConfig,
    RawVoiceInfo,
    RawColor,
    RawContextMenuTarget,
    RawContextMenuBuilder,
    RawRemoteControlsPage,
    RawNoteName,
    RawAmbisonicConfig,
    RawAudioPortConfigurationRequest,
    RawGuiResizeHints,
    RawWindow,
);

/// `clap_plugin_descriptor_t`.
#[repr(C)]
#[derive(Debug)]
pub struct RawPluginDescriptor {
    pub clap_version: ClapVersion,
    pub id: *const c_char,
    pub name: *const c_char,
    pub vendor: *const c_char,
    pub url: *const c_char,
    pub manual_url: *const c_char,
    pub support_url: *const c_char,
    pub version: *const c_char,
    pub description: *const c_char,
    /// Null-terminated array of feature strings.
    pub features: *const *const c_char,
}

/// `clap_plugin_t`: the per-instance vtable handed to the host.
#[repr(C)]
pub struct RawPlugin {
    pub desc: *const RawPluginDescriptor,
    pub plugin_data: *mut c_void,
    pub init: Option<unsafe extern "C" fn(plugin: *const RawPlugin) -> bool>,
    pub destroy: Option<unsafe extern "C" fn(plugin: *const RawPlugin)>,
    pub activate: Option<
        unsafe extern "C" fn(
            plugin: *const RawPlugin,
            sample_rate: f64,
            min_frames_count: u32,
            max_frames_count: u32,
        ) -> bool,
    >,
    pub deactivate: Option<unsafe extern "C" fn(plugin: *const RawPlugin)>,
    pub start_processing: Option<unsafe extern "C" fn(plugin: *const RawPlugin) -> bool>,
    pub stop_processing: Option<unsafe extern "C" fn(plugin: *const RawPlugin)>,
    pub reset: Option<unsafe extern "C" fn(plugin: *const RawPlugin)>,
    pub process:
        Option<unsafe extern "C" fn(plugin: *const RawPlugin, process: *const RawProcess) -> i32>,
    pub get_extension:
        Option<unsafe extern "C" fn(plugin: *const RawPlugin, id: *const c_char) -> *const c_void>,
    pub on_main_thread: Option<unsafe extern "C" fn(plugin: *const RawPlugin)>,
}

/// `clap_plugin_factory_t`.
#[repr(C)]
pub struct RawPluginFactory {
    pub get_plugin_count: Option<unsafe extern "C" fn(factory: *const RawPluginFactory) -> u32>,
    pub get_plugin_descriptor: Option<
        unsafe extern "C" fn(
            factory: *const RawPluginFactory,
            index: u32,
        ) -> *const RawPluginDescriptor,
    >,
    pub create_plugin: Option<
        unsafe extern "C" fn(
            factory: *const RawPluginFactory,
            host: *const RawHost,
            plugin_id: *const c_char,
        ) -> *const RawPlugin,
    >,
}

/// `clap_plugin_entry_t`, exported as the `clap_entry` symbol.
#[repr(C)]
pub struct RawPluginEntry {
    pub clap_version: ClapVersion,
    pub init: Option<unsafe extern "C" fn(plugin_path: *const c_char) -> bool>,
    pub deinit: Option<unsafe extern "C" fn()>,
    pub get_factory: Option<unsafe extern "C" fn(factory_id: *const c_char) -> *const c_void>,
}

/// `clap_audio_port_info_t`.
#[repr(C)]
pub struct RawAudioPortInfo {
    pub id: u32,
    pub name: [c_char; CLAP_NAME_SIZE],
    pub flags: u32,
    pub channel_count: u32,
    pub port_type: *const c_char,
    pub in_place_pair: u32,
}

// SAFETY: these tables hold only pointers to immutable, process-lifetime
// data (static strings, static functions, or descriptors pinned for the
// bridge's lifetime).
unsafe impl Send for RawPluginDescriptor {}
unsafe impl Sync for RawPluginDescriptor {}

/// Copy `text` into a fixed C name buffer, truncating and NUL-terminating.
pub fn write_name(dst: &mut [c_char; CLAP_NAME_SIZE], text: &str) {
    let len = text.len().min(CLAP_NAME_SIZE - 1);
    for (slot, byte) in dst.iter_mut().zip(text.as_bytes()[..len].iter()) {
        *slot = *byte as c_char;
    }
    dst[len] = 0;
}

// ---------------------------------------------------------------------------
// Extension tables. One struct per extension id, plugin pointer first.
// ---------------------------------------------------------------------------

type Plugin = *const RawPlugin;

/// `clap_plugin_audio_ports_t`.
#[repr(C)]
pub struct ClapPluginAudioPorts {
    pub count: Option<unsafe extern "C" fn(Plugin, is_input: bool) -> u32>,
    pub get: Option<
        unsafe extern "C" fn(Plugin, index: u32, is_input: bool, info: *mut RawAudioPortInfo) -> bool,
    >,
}

/// `clap_plugin_params_t`.
#[repr(C)]
pub struct ClapPluginParams {
    pub count: Option<unsafe extern "C" fn(Plugin) -> u32>,
    pub get_info: Option<unsafe extern "C" fn(Plugin, index: u32, info: *mut RawParamInfo) -> bool>,
    pub get_value: Option<unsafe extern "C" fn(Plugin, param_id: u32, out: *mut f64) -> bool>,
    pub value_to_text: Option<
        unsafe extern "C" fn(Plugin, param_id: u32, value: f64, out: *mut c_char, capacity: u32) -> bool,
    >,
    pub text_to_value: Option<
        unsafe extern "C" fn(Plugin, param_id: u32, text: *const c_char, out: *mut f64) -> bool,
    >,
    pub flush: Option<
        unsafe extern "C" fn(Plugin, input: *const RawInputEvents, output: *const RawOutputEvents),
    >,
}

/// `clap_plugin_state_t`.
#[repr(C)]
pub struct ClapPluginState {
    pub save: Option<unsafe extern "C" fn(Plugin, stream: *const RawOutputStream) -> bool>,
    pub load: Option<unsafe extern "C" fn(Plugin, stream: *const RawInputStream) -> bool>,
}

/// `clap_plugin_state_context_t`.
#[repr(C)]
pub struct ClapPluginStateContext {
    pub save: Option<
        unsafe extern "C" fn(Plugin, stream: *const RawOutputStream, context_type: u32) -> bool,
    >,
    pub load: Option<
        unsafe extern "C" fn(Plugin, stream: *const RawInputStream, context_type: u32) -> bool,
    >,
}

/// `clap_plugin_note_ports_t`.
#[repr(C)]
pub struct ClapPluginNotePorts {
    pub count: Option<unsafe extern "C" fn(Plugin, is_input: bool) -> u32>,
    pub get: Option<
        unsafe extern "C" fn(Plugin, index: u32, is_input: bool, info: *mut RawNotePortInfo) -> bool,
    >,
}

/// `clap_plugin_latency_t`.
#[repr(C)]
pub struct ClapPluginLatency {
    pub get: Option<unsafe extern "C" fn(Plugin) -> u32>,
}

/// `clap_plugin_tail_t`.
#[repr(C)]
pub struct ClapPluginTail {
    pub get: Option<unsafe extern "C" fn(Plugin) -> u32>,
}

/// `clap_plugin_timer_support_t`.
#[repr(C)]
pub struct ClapPluginTimerSupport {
    pub on_timer: Option<unsafe extern "C" fn(Plugin, timer_id: u32)>,
}

/// `clap_plugin_audio_ports_config_t`.
#[repr(C)]
pub struct ClapPluginAudioPortsConfig {
    pub count: Option<unsafe extern "C" fn(Plugin) -> u32>,
    pub get: Option<unsafe extern "C" fn(Plugin, index: u32, config: *mut RawAudioPortsConfig) -> bool>,
    pub select: Option<unsafe extern "C" fn(Plugin, config_id: u32) -> bool>,
}

/// `clap_plugin_audio_ports_config_info_t`.
#[repr(C)]
pub struct ClapPluginAudioPortsConfigInfo {
    pub current_config: Option<unsafe extern "C" fn(Plugin) -> u32>,
    pub get: Option<
        unsafe extern "C" fn(
            Plugin,
            config_id: u32,
            port_index: u32,
            is_input: bool,
            info: *mut RawAudioPortInfo,
        ) -> bool,
    >,
}

/// `clap_plugin_surround_t`.
#[repr(C)]
pub struct ClapPluginSurround {
    pub is_channel_mask_supported: Option<unsafe extern "C" fn(Plugin, channel_mask: u64) -> bool>,
    pub get_channel_map: Option<
        unsafe extern "C" fn(
            Plugin,
            is_input: bool,
            port_index: u32,
            channel_map: *mut u8,
            capacity: u32,
        ) -> u32,
    >,
}

/// `clap_plugin_voice_info_t`.
#[repr(C)]
pub struct ClapPluginVoiceInfo {
    pub get: Option<unsafe extern "C" fn(Plugin, info: *mut RawVoiceInfo) -> bool>,
}

/// `clap_plugin_preset_load_t`.
#[repr(C)]
pub struct ClapPluginPresetLoad {
    pub from_location: Option<
        unsafe extern "C" fn(
            Plugin,
            location_kind: u32,
            location: *const c_char,
            load_key: *const c_char,
        ) -> bool,
    >,
}

/// `clap_plugin_track_info_t`.
#[repr(C)]
pub struct ClapPluginTrackInfo {
    pub changed: Option<unsafe extern "C" fn(Plugin)>,
}

/// `clap_plugin_param_indication_t`.
#[repr(C)]
pub struct ClapPluginParamIndication {
    pub set_mapping: Option<
        unsafe extern "C" fn(
            Plugin,
            param_id: u32,
            has_mapping: bool,
            color: *const RawColor,
            label: *const c_char,
            description: *const c_char,
        ),
    >,
    pub set_automation: Option<
        unsafe extern "C" fn(Plugin, param_id: u32, automation_state: u32, color: *const RawColor),
    >,
}

/// `clap_plugin_context_menu_t`.
#[repr(C)]
pub struct ClapPluginContextMenu {
    pub populate: Option<
        unsafe extern "C" fn(
            Plugin,
            target: *const RawContextMenuTarget,
            builder: *const RawContextMenuBuilder,
        ) -> bool,
    >,
    pub perform: Option<
        unsafe extern "C" fn(Plugin, target: *const RawContextMenuTarget, action_id: u32) -> bool,
    >,
}

/// `clap_plugin_remote_controls_t`.
#[repr(C)]
pub struct ClapPluginRemoteControls {
    pub count: Option<unsafe extern "C" fn(Plugin) -> u32>,
    pub get: Option<
        unsafe extern "C" fn(Plugin, page_index: u32, page: *mut RawRemoteControlsPage) -> bool,
    >,
}

/// `clap_plugin_note_name_t`.
#[repr(C)]
pub struct ClapPluginNoteName {
    pub count: Option<unsafe extern "C" fn(Plugin) -> u32>,
    pub get: Option<unsafe extern "C" fn(Plugin, index: u32, note_name: *mut RawNoteName) -> bool>,
}

/// `clap_plugin_ambisonic_t`.
#[repr(C)]
pub struct ClapPluginAmbisonic {
    pub is_config_supported:
        Option<unsafe extern "C" fn(Plugin, config: *const RawAmbisonicConfig) -> bool>,
    pub get_config: Option<
        unsafe extern "C" fn(
            Plugin,
            is_input: bool,
            port_index: u32,
            config: *mut RawAmbisonicConfig,
        ) -> bool,
    >,
}

/// `clap_plugin_audio_ports_activation_t`.
#[repr(C)]
pub struct ClapPluginAudioPortsActivation {
    pub can_activate_while_processing: Option<unsafe extern "C" fn(Plugin) -> bool>,
    pub set_active: Option<
        unsafe extern "C" fn(
            Plugin,
            is_input: bool,
            port_index: u32,
            is_active: bool,
            sample_size: u32,
        ) -> bool,
    >,
}

/// `clap_plugin_configurable_audio_ports_t`.
#[repr(C)]
pub struct ClapPluginConfigurableAudioPorts {
    pub can_apply_configuration: Option<
        unsafe extern "C" fn(
            Plugin,
            requests: *const RawAudioPortConfigurationRequest,
            request_count: u32,
        ) -> bool,
    >,
    pub apply_configuration: Option<
        unsafe extern "C" fn(
            Plugin,
            requests: *const RawAudioPortConfigurationRequest,
            request_count: u32,
        ) -> bool,
    >,
}

/// `clap_plugin_render_t`.
#[repr(C)]
pub struct ClapPluginRender {
    pub has_hard_realtime_requirement: Option<unsafe extern "C" fn(Plugin) -> bool>,
    pub set: Option<unsafe extern "C" fn(Plugin, mode: i32) -> bool>,
}

/// `clap_plugin_thread_pool_t`.
#[repr(C)]
pub struct ClapPluginThreadPool {
    pub exec: Option<unsafe extern "C" fn(Plugin, task_index: u32)>,
}

/// `clap_plugin_posix_fd_support_t`.
#[repr(C)]
pub struct ClapPluginPosixFdSupport {
    pub on_fd: Option<unsafe extern "C" fn(Plugin, fd: i32, flags: u32)>,
}

/// `clap_plugin_tuning_t`.
#[repr(C)]
pub struct ClapPluginTuning {
    pub changed: Option<unsafe extern "C" fn(Plugin)>,
}

/// `clap_plugin_gui_t`.
#[repr(C)]
pub struct ClapPluginGui {
    pub is_api_supported:
        Option<unsafe extern "C" fn(Plugin, api: *const c_char, is_floating: bool) -> bool>,
    pub get_preferred_api: Option<
        unsafe extern "C" fn(Plugin, api: *mut *const c_char, is_floating: *mut bool) -> bool,
    >,
    pub create: Option<unsafe extern "C" fn(Plugin, api: *const c_char, is_floating: bool) -> bool>,
    pub destroy: Option<unsafe extern "C" fn(Plugin)>,
    pub set_scale: Option<unsafe extern "C" fn(Plugin, scale: f64) -> bool>,
    pub get_size: Option<unsafe extern "C" fn(Plugin, width: *mut u32, height: *mut u32) -> bool>,
    pub can_resize: Option<unsafe extern "C" fn(Plugin) -> bool>,
    pub get_resize_hints: Option<unsafe extern "C" fn(Plugin, hints: *mut RawGuiResizeHints) -> bool>,
    pub adjust_size:
        Option<unsafe extern "C" fn(Plugin, width: *mut u32, height: *mut u32) -> bool>,
    pub set_size: Option<unsafe extern "C" fn(Plugin, width: u32, height: u32) -> bool>,
    pub set_parent: Option<unsafe extern "C" fn(Plugin, window: *const RawWindow) -> bool>,
    pub set_transient: Option<unsafe extern "C" fn(Plugin, window: *const RawWindow) -> bool>,
    pub suggest_title: Option<unsafe extern "C" fn(Plugin, title: *const c_char)>,
    pub show: Option<unsafe extern "C" fn(Plugin) -> bool>,
    pub hide: Option<unsafe extern "C" fn(Plugin) -> bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_name_truncates_and_terminates() {
        let mut buf = [1 as c_char; CLAP_NAME_SIZE];
        write_name(&mut buf, "Stereo In");
        // SAFETY: write_name always NUL-terminates inside the buffer.
        let text = unsafe { CStr::from_ptr(buf.as_ptr()) };
        assert_eq!(text.to_str().unwrap(), "Stereo In");

        let long = "x".repeat(CLAP_NAME_SIZE * 2);
        write_name(&mut buf, &long);
        assert_eq!(buf[CLAP_NAME_SIZE - 1], 0);
        let text = unsafe { CStr::from_ptr(buf.as_ptr()) };
        assert_eq!(text.to_bytes().len(), CLAP_NAME_SIZE - 1);
    }

    #[test]
    fn plugin_vtable_layout_matches_pointer_count() {
        // desc + plugin_data + ten function slots.
        assert_eq!(
            std::mem::size_of::<RawPlugin>(),
            12 * std::mem::size_of::<*const c_void>()
        );
    }
}
