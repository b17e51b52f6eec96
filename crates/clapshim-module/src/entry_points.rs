// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed entry-point groups and the module-side naming convention.
//!
//! Every module function is exported as `clapshim_<group>_<function>` and
//! takes the module's own instance pointer first (except the constructor
//! and the version probe). A group resolves all-or-nothing: if any one of
//! its symbols is missing, the whole group is `None` and the matching
//! capability is off.

use std::ffi::{c_char, c_void};

use clapshim_core::abi::{
    RawAmbisonicConfig, RawAudioPortConfigurationRequest, RawAudioPortInfo, RawAudioPortsConfig,
    RawColor, RawContextMenuBuilder, RawContextMenuTarget, RawGuiResizeHints, RawHost,
    RawInputEvents, RawInputStream, RawNoteName, RawNotePortInfo, RawOutputEvents,
    RawOutputStream, RawParamInfo, RawProcess, RawRemoteControlsPage, RawVoiceInfo, RawWindow,
};
use clapshim_core::{CapabilitySet, Extension};
use tracing::{debug, warn};

use crate::symbols::SymbolTable;

/// Prefix shared by every module export.
pub const SYMBOL_PREFIX: &str = "clapshim_";

/// Module-side instance pointer, opaque to the bridge.
pub type Inst = *mut c_void;

/// Outcome of resolving one group against a symbol table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupResolution<T> {
    Resolved(T),
    /// Nothing from the group is exported.
    Absent,
    /// Some symbols are exported, these are not.
    Partial(Vec<&'static str>),
}

impl<T> GroupResolution<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            GroupResolution::Resolved(group) => Some(group),
            _ => None,
        }
    }
}

macro_rules! entry_point_group {
    (
        $(#[$meta:meta])*
        pub struct $name:ident : $group:literal {
            $( $field:ident : fn( $($arg:ty),* ) $(-> $ret:ty)? ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy)]
        pub struct $name {
            $( pub $field: unsafe extern "C" fn($($arg),*) $(-> $ret)?, )*
        }

        impl $name {
            /// Group name in exported symbols.
            pub const GROUP: &'static str = $group;

            /// Every exported name this group needs.
            pub const SYMBOLS: &'static [&'static str] =
                &[$( concat!("clapshim_", $group, "_", stringify!($field)) ),*];

            /// Resolve every symbol of the group.
            pub fn resolve(symbols: &dyn SymbolTable) -> GroupResolution<Self> {
                let mut missing: Vec<&'static str> = Vec::new();
                $(
                    let $field = {
                        let name = concat!("clapshim_", $group, "_", stringify!($field));
                        let found = symbols.lookup(name);
                        if found.is_none() {
                            missing.push(name);
                        }
                        found
                    };
                )*
                match ($($field,)*) {
                    ($(Some($field),)*) => {
                        // SAFETY: the naming convention binds each exported
                        // name to exactly this signature.
                        GroupResolution::Resolved(unsafe {
                            $name {
                                $(
                                    $field: std::mem::transmute::<
                                        *mut c_void,
                                        unsafe extern "C" fn($($arg),*) $(-> $ret)?,
                                    >($field.as_ptr()),
                                )*
                            }
                        })
                    }
                    _ if missing.len() == Self::SYMBOLS.len() => GroupResolution::Absent,
                    _ => GroupResolution::Partial(missing),
                }
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name))
                    $( .field(stringify!($field), &(self.$field as *const c_void)) )*
                    .finish()
            }
        }
    };
}

entry_point_group! {
    /// Mandatory lifecycle and processing entry points.
    pub struct PluginEntryPoints: "plugin" {
        create: fn(*const RawHost, *const c_char) -> Inst,
        init: fn(Inst) -> bool,
        destroy: fn(Inst),
        activate: fn(Inst, f64, u32, u32) -> bool,
        deactivate: fn(Inst),
        start_processing: fn(Inst) -> bool,
        stop_processing: fn(Inst),
        reset: fn(Inst),
        process: fn(Inst, *const RawProcess) -> i32,
    }
}

entry_point_group! {
    /// Optional main-thread callback.
    pub struct MainThreadEntryPoints: "plugin" {
        on_main_thread: fn(Inst),
    }
}

entry_point_group! {
    /// Optional API version probe, exported as `clapshim_get_version`.
    pub struct VersionEntryPoints: "get" {
        version: fn(*mut u32, *mut u32, *mut u32) -> bool,
    }
}

entry_point_group! {
    pub struct ParamsEntryPoints: "params" {
        count: fn(Inst) -> u32,
        get_info: fn(Inst, u32, *mut RawParamInfo) -> bool,
        get_value: fn(Inst, u32, *mut f64) -> bool,
        value_to_text: fn(Inst, u32, f64, *mut c_char, u32) -> bool,
        text_to_value: fn(Inst, u32, *const c_char, *mut f64) -> bool,
        flush: fn(Inst, *const RawInputEvents, *const RawOutputEvents),
    }
}

entry_point_group! {
    pub struct StateEntryPoints: "state" {
        save: fn(Inst, *const RawOutputStream) -> bool,
        load: fn(Inst, *const RawInputStream) -> bool,
    }
}

entry_point_group! {
    pub struct StateContextEntryPoints: "state_context" {
        save: fn(Inst, *const RawOutputStream, u32) -> bool,
        load: fn(Inst, *const RawInputStream, u32) -> bool,
    }
}

entry_point_group! {
    pub struct NotePortsEntryPoints: "note_ports" {
        count: fn(Inst, bool) -> u32,
        get: fn(Inst, u32, bool, *mut RawNotePortInfo) -> bool,
    }
}

entry_point_group! {
    pub struct LatencyEntryPoints: "latency" {
        get: fn(Inst) -> u32,
    }
}

entry_point_group! {
    pub struct TailEntryPoints: "tail" {
        get: fn(Inst) -> u32,
    }
}

entry_point_group! {
    pub struct TimerSupportEntryPoints: "timer" {
        on_timer: fn(Inst, u32),
    }
}

entry_point_group! {
    pub struct AudioPortsConfigEntryPoints: "audio_ports_config" {
        count: fn(Inst) -> u32,
        get: fn(Inst, u32, *mut RawAudioPortsConfig) -> bool,
        select: fn(Inst, u32) -> bool,
    }
}

entry_point_group! {
    pub struct AudioPortsConfigInfoEntryPoints: "audio_ports_config_info" {
        current_config: fn(Inst) -> u32,
        get: fn(Inst, u32, u32, bool, *mut RawAudioPortInfo) -> bool,
    }
}

entry_point_group! {
    pub struct SurroundEntryPoints: "surround" {
        is_channel_mask_supported: fn(Inst, u64) -> bool,
        get_channel_map: fn(Inst, bool, u32, *mut u8, u32) -> u32,
    }
}

entry_point_group! {
    pub struct VoiceInfoEntryPoints: "voice_info" {
        get: fn(Inst, *mut RawVoiceInfo) -> bool,
    }
}

entry_point_group! {
    pub struct PresetLoadEntryPoints: "preset_load" {
        from_location: fn(Inst, u32, *const c_char, *const c_char) -> bool,
    }
}

entry_point_group! {
    pub struct TrackInfoEntryPoints: "track_info" {
        changed: fn(Inst),
    }
}

entry_point_group! {
    pub struct ParamIndicationEntryPoints: "param_indication" {
        set_mapping: fn(Inst, u32, bool, *const RawColor, *const c_char, *const c_char),
        set_automation: fn(Inst, u32, u32, *const RawColor),
    }
}

entry_point_group! {
    pub struct ContextMenuEntryPoints: "context_menu" {
        populate: fn(Inst, *const RawContextMenuTarget, *const RawContextMenuBuilder) -> bool,
        perform: fn(Inst, *const RawContextMenuTarget, u32) -> bool,
    }
}

entry_point_group! {
    pub struct RemoteControlsEntryPoints: "remote_controls" {
        count: fn(Inst) -> u32,
        get: fn(Inst, u32, *mut RawRemoteControlsPage) -> bool,
    }
}

entry_point_group! {
    pub struct NoteNameEntryPoints: "note_name" {
        count: fn(Inst) -> u32,
        get: fn(Inst, u32, *mut RawNoteName) -> bool,
    }
}

entry_point_group! {
    pub struct AmbisonicEntryPoints: "ambisonic" {
        is_config_supported: fn(Inst, *const RawAmbisonicConfig) -> bool,
        get_config: fn(Inst, bool, u32, *mut RawAmbisonicConfig) -> bool,
    }
}

entry_point_group! {
    pub struct AudioPortsActivationEntryPoints: "audio_ports_activation" {
        can_activate_while_processing: fn(Inst) -> bool,
        set_active: fn(Inst, bool, u32, bool, u32) -> bool,
    }
}

entry_point_group! {
    pub struct ConfigurableAudioPortsEntryPoints: "configurable_audio_ports" {
        can_apply_configuration: fn(Inst, *const RawAudioPortConfigurationRequest, u32) -> bool,
        apply_configuration: fn(Inst, *const RawAudioPortConfigurationRequest, u32) -> bool,
    }
}

entry_point_group! {
    pub struct RenderEntryPoints: "render" {
        has_hard_realtime_requirement: fn(Inst) -> bool,
        set: fn(Inst, i32) -> bool,
    }
}

entry_point_group! {
    pub struct ThreadPoolEntryPoints: "thread_pool" {
        exec: fn(Inst, u32),
    }
}

entry_point_group! {
    pub struct PosixFdSupportEntryPoints: "posix_fd" {
        on_fd: fn(Inst, i32, u32),
    }
}

entry_point_group! {
    pub struct TuningEntryPoints: "tuning" {
        changed: fn(Inst),
    }
}

entry_point_group! {
    pub struct GuiEntryPoints: "gui" {
        is_api_supported: fn(Inst, *const c_char, bool) -> bool,
        get_preferred_api: fn(Inst, *mut *const c_char, *mut bool) -> bool,
        create: fn(Inst, *const c_char, bool) -> bool,
        destroy: fn(Inst),
        set_scale: fn(Inst, f64) -> bool,
        get_size: fn(Inst, *mut u32, *mut u32) -> bool,
        can_resize: fn(Inst) -> bool,
        get_resize_hints: fn(Inst, *mut RawGuiResizeHints) -> bool,
        adjust_size: fn(Inst, *mut u32, *mut u32) -> bool,
        set_size: fn(Inst, u32, u32) -> bool,
        set_parent: fn(Inst, *const RawWindow) -> bool,
        set_transient: fn(Inst, *const RawWindow) -> bool,
        suggest_title: fn(Inst, *const c_char),
        show: fn(Inst) -> bool,
        hide: fn(Inst) -> bool,
    }
}

macro_rules! extension_entry_points {
    ($( $variant:ident => $field:ident : $group:ty ),* $(,)?) => {
        /// One optional group per protocol extension.
        #[derive(Debug, Clone, Copy, Default)]
        pub struct ExtensionEntryPoints {
            $( pub $field: Option<$group>, )*
        }

        impl ExtensionEntryPoints {
            /// Resolve every extension group independently.
            ///
            /// Groups exported only in part are logged and treated as absent.
            pub fn resolve(symbols: &dyn SymbolTable) -> Self {
                ExtensionEntryPoints {
                    $(
                        $field: match <$group>::resolve(symbols) {
                            GroupResolution::Resolved(group) => Some(group),
                            GroupResolution::Absent => None,
                            GroupResolution::Partial(missing) => {
                                warn!(
                                    module = %symbols.origin(),
                                    extension = %Extension::$variant,
                                    missing = ?missing,
                                    "extension exported only in part, treating as unsupported"
                                );
                                None
                            }
                        },
                    )*
                }
            }

            /// Fold group presence into a capability map.
            pub fn capabilities(&self) -> CapabilitySet {
                let mut set = CapabilitySet::empty();
                $(
                    if self.$field.is_some() {
                        set = set.with(Extension::$variant);
                    }
                )*
                set
            }

            /// Symbols every extension group needs, by extension.
            pub fn symbols_of(ext: Extension) -> &'static [&'static str] {
                match ext {
                    $( Extension::$variant => <$group>::SYMBOLS, )*
                }
            }
        }
    };
}

extension_entry_points! {
    Params => params: ParamsEntryPoints,
    State => state: StateEntryPoints,
    StateContext => state_context: StateContextEntryPoints,
    NotePorts => note_ports: NotePortsEntryPoints,
    Latency => latency: LatencyEntryPoints,
    Tail => tail: TailEntryPoints,
    TimerSupport => timer_support: TimerSupportEntryPoints,
    AudioPortsConfig => audio_ports_config: AudioPortsConfigEntryPoints,
    AudioPortsConfigInfo => audio_ports_config_info: AudioPortsConfigInfoEntryPoints,
    Surround => surround: SurroundEntryPoints,
    VoiceInfo => voice_info: VoiceInfoEntryPoints,
    PresetLoad => preset_load: PresetLoadEntryPoints,
    TrackInfo => track_info: TrackInfoEntryPoints,
    ParamIndication => param_indication: ParamIndicationEntryPoints,
    ContextMenu => context_menu: ContextMenuEntryPoints,
    RemoteControls => remote_controls: RemoteControlsEntryPoints,
    NoteName => note_name: NoteNameEntryPoints,
    Ambisonic => ambisonic: AmbisonicEntryPoints,
    AudioPortsActivation => audio_ports_activation: AudioPortsActivationEntryPoints,
    ConfigurableAudioPorts => configurable_audio_ports: ConfigurableAudioPortsEntryPoints,
    Render => render: RenderEntryPoints,
    ThreadPool => thread_pool: ThreadPoolEntryPoints,
    PosixFdSupport => posix_fd_support: PosixFdSupportEntryPoints,
    Tuning => tuning: TuningEntryPoints,
    Gui => gui: GuiEntryPoints,
}

/// The complete, resolved entry-point set of a module.
#[derive(Debug, Clone, Copy)]
pub struct EntryPoints {
    pub plugin: PluginEntryPoints,
    pub main_thread: Option<MainThreadEntryPoints>,
    pub version: Option<VersionEntryPoints>,
    pub extensions: ExtensionEntryPoints,
}

impl EntryPoints {
    /// Entry points of a unit that implements only the mandatory set.
    pub fn new(plugin: PluginEntryPoints) -> Self {
        Self {
            plugin,
            main_thread: None,
            version: None,
            extensions: ExtensionEntryPoints::default(),
        }
    }

    /// Resolve by name. Fails with the list of missing mandatory symbols.
    pub fn resolve(symbols: &dyn SymbolTable) -> Result<Self, Vec<&'static str>> {
        let plugin = match PluginEntryPoints::resolve(symbols) {
            GroupResolution::Resolved(plugin) => plugin,
            GroupResolution::Absent => return Err(PluginEntryPoints::SYMBOLS.to_vec()),
            GroupResolution::Partial(missing) => return Err(missing),
        };
        let entry_points = Self {
            plugin,
            main_thread: MainThreadEntryPoints::resolve(symbols).ok(),
            version: VersionEntryPoints::resolve(symbols).ok(),
            extensions: ExtensionEntryPoints::resolve(symbols),
        };
        debug!(
            module = %symbols.origin(),
            capabilities = %entry_points.capabilities(),
            "entry points resolved"
        );
        Ok(entry_points)
    }

    pub fn capabilities(&self) -> CapabilitySet {
        self.extensions.capabilities()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn symbol_names_follow_convention() {
        assert_eq!(PluginEntryPoints::SYMBOLS[0], "clapshim_plugin_create");
        assert_eq!(PluginEntryPoints::SYMBOLS.len(), 9);
        assert_eq!(
            MainThreadEntryPoints::SYMBOLS,
            &["clapshim_plugin_on_main_thread"]
        );
        assert_eq!(VersionEntryPoints::SYMBOLS, &["clapshim_get_version"]);
        assert_eq!(
            StateContextEntryPoints::SYMBOLS,
            &["clapshim_state_context_save", "clapshim_state_context_load"]
        );
        assert_eq!(PosixFdSupportEntryPoints::SYMBOLS, &["clapshim_posix_fd_on_fd"]);
    }

    #[test]
    fn every_extension_has_a_symbol_group() {
        let mut seen = std::collections::HashSet::new();
        for ext in Extension::iter() {
            let symbols = ExtensionEntryPoints::symbols_of(ext);
            assert!(!symbols.is_empty(), "{ext} has no symbols");
            for symbol in symbols {
                assert!(symbol.starts_with(SYMBOL_PREFIX));
                assert!(seen.insert(*symbol), "{symbol} used twice");
            }
        }
    }

    #[test]
    fn empty_extension_set_has_no_capabilities() {
        assert!(ExtensionEntryPoints::default().capabilities().is_empty());
    }
}
