// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Catalogue of optional protocol extensions and the per-instance
//! capability map derived from it.

use std::ffi::CStr;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, EnumString, IntoEnumIterator};

/// One optional protocol extension a module may or may not implement.
///
/// The string form (`params`, `note-ports`, ...) is the short name used in
/// logs and the CLI. The protocol id is available via [`Extension::id`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    EnumCount,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Extension {
    Params,
    State,
    StateContext,
    NotePorts,
    Latency,
    Tail,
    TimerSupport,
    AudioPortsConfig,
    AudioPortsConfigInfo,
    Surround,
    VoiceInfo,
    PresetLoad,
    TrackInfo,
    ParamIndication,
    ContextMenu,
    RemoteControls,
    NoteName,
    Ambisonic,
    AudioPortsActivation,
    ConfigurableAudioPorts,
    Render,
    ThreadPool,
    PosixFdSupport,
    Tuning,
    Gui,
}

impl Extension {
    /// Stable protocol id of this extension.
    pub const fn id(self) -> &'static CStr {
        match self {
            Extension::Params => c"clap.params",
            Extension::State => c"clap.state",
            Extension::StateContext => c"clap.state-context/2",
            Extension::NotePorts => c"clap.note-ports",
            Extension::Latency => c"clap.latency",
            Extension::Tail => c"clap.tail",
            Extension::TimerSupport => c"clap.timer-support",
            Extension::AudioPortsConfig => c"clap.audio-ports-config",
            Extension::AudioPortsConfigInfo => c"clap.audio-ports-config-info/1",
            Extension::Surround => c"clap.surround/4",
            Extension::VoiceInfo => c"clap.voice-info",
            Extension::PresetLoad => c"clap.preset-load/2",
            Extension::TrackInfo => c"clap.track-info/1",
            Extension::ParamIndication => c"clap.param-indication/4",
            Extension::ContextMenu => c"clap.context-menu/1",
            Extension::RemoteControls => c"clap.remote-controls/2",
            Extension::NoteName => c"clap.note-name",
            Extension::Ambisonic => c"clap.ambisonic/3",
            Extension::AudioPortsActivation => c"clap.audio-ports-activation/2",
            Extension::ConfigurableAudioPorts => c"clap.configurable-audio-ports/1",
            Extension::Render => c"clap.render",
            Extension::ThreadPool => c"clap.thread-pool",
            Extension::PosixFdSupport => c"clap.posix-fd-support",
            Extension::Tuning => c"clap.tuning.draft/2",
            Extension::Gui => c"clap.gui",
        }
    }

    /// Draft id that older hosts still query, if the extension has one.
    pub const fn compat_id(self) -> Option<&'static CStr> {
        match self {
            Extension::AudioPortsConfigInfo => Some(c"clap.audio-ports-config-info/draft-0"),
            Extension::Surround => Some(c"clap.surround.draft/4"),
            Extension::PresetLoad => Some(c"clap.preset-load.draft/2"),
            Extension::TrackInfo => Some(c"clap.track-info.draft/1"),
            Extension::ParamIndication => Some(c"clap.param-indication.draft/4"),
            Extension::ContextMenu => Some(c"clap.context-menu.draft/0"),
            Extension::RemoteControls => Some(c"clap.remote-controls.draft/2"),
            Extension::Ambisonic => Some(c"clap.ambisonic.draft/3"),
            Extension::AudioPortsActivation => Some(c"clap.audio-ports-activation/draft-2"),
            Extension::ConfigurableAudioPorts => Some(c"clap.configurable-audio-ports.draft1"),
            _ => None,
        }
    }

    /// Look an extension up by stable or compat protocol id.
    pub fn from_id(id: &CStr) -> Option<Self> {
        Extension::iter().find(|ext| ext.id() == id || ext.compat_id() == Some(id))
    }

    /// Same as [`Extension::from_id`] for ids held as Rust strings.
    pub fn from_id_str(id: &str) -> Option<Self> {
        Extension::iter().find(|ext| {
            ext.id().to_bytes() == id.as_bytes()
                || ext.compat_id().is_some_and(|c| c.to_bytes() == id.as_bytes())
        })
    }

    const fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

/// Immutable per-module capability map: one flag per [`Extension`].
///
/// Built once when a module's entry points are resolved and copied into
/// every instance record, so dispatch never consults symbols again.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CapabilitySet(u32);

const _: () = assert!(Extension::COUNT <= u32::BITS as usize);

impl CapabilitySet {
    /// An empty set: only the bridge-owned audio ports are available.
    pub const fn empty() -> Self {
        CapabilitySet(0)
    }

    /// Return a copy of this set with `ext` marked present.
    #[must_use]
    pub const fn with(self, ext: Extension) -> Self {
        CapabilitySet(self.0 | ext.bit())
    }

    pub const fn contains(self, ext: Extension) -> bool {
        self.0 & ext.bit() != 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Extensions present in this set, in declaration order.
    pub fn iter(self) -> impl Iterator<Item = Extension> {
        Extension::iter().filter(move |ext| self.contains(*ext))
    }
}

impl FromIterator<Extension> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Extension>>(iter: I) -> Self {
        iter.into_iter()
            .fold(CapabilitySet::empty(), CapabilitySet::with)
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.iter().map(|ext| ext.to_string()).collect();
        if names.is_empty() {
            write!(f, "(none)")
        } else {
            write!(f, "{}", names.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    #[test]
    fn short_names_round_trip() {
        for ext in Extension::iter() {
            let name = ext.to_string();
            assert_eq!(Extension::from_str(&name).unwrap(), ext);
        }
        assert_eq!(Extension::NotePorts.to_string(), "note-ports");
        assert_eq!(Extension::PosixFdSupport.to_string(), "posix-fd-support");
    }

    #[test]
    fn ids_are_unique() {
        let mut ids: Vec<&CStr> = Extension::iter().map(Extension::id).collect();
        ids.extend(Extension::iter().filter_map(Extension::compat_id));
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn lookup_by_stable_and_compat_id() {
        assert_eq!(Extension::from_id(c"clap.params"), Some(Extension::Params));
        assert_eq!(
            Extension::from_id(c"clap.surround.draft/4"),
            Some(Extension::Surround)
        );
        assert_eq!(Extension::from_id(c"clap.audio-ports"), None);
        assert_eq!(Extension::from_id_str("clap.state"), Some(Extension::State));
        assert_eq!(Extension::from_id_str("clap.nope"), None);
    }

    #[test]
    fn capability_set_display() {
        let set: CapabilitySet = [Extension::State, Extension::Params].into_iter().collect();
        assert_eq!(set.to_string(), "params, state");
        assert_eq!(CapabilitySet::empty().to_string(), "(none)");
    }

    fn any_extension() -> impl Strategy<Value = Extension> {
        (0..Extension::COUNT).prop_map(|i| Extension::iter().nth(i).unwrap())
    }

    proptest! {
        #[test]
        fn set_contains_exactly_what_was_added(exts in proptest::collection::vec(any_extension(), 0..12)) {
            let set: CapabilitySet = exts.iter().copied().collect();
            for ext in Extension::iter() {
                prop_assert_eq!(set.contains(ext), exts.contains(&ext));
            }
            let mut unique = exts.clone();
            unique.sort();
            unique.dedup();
            prop_assert_eq!(set.len(), unique.len());
        }
    }
}
