// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host-facing factories.
//!
//! The plugin factory table carries a pointer back to its [`Bridge`], so
//! every factory call reaches the owned bridge without global lookups.
//! Auxiliary factories (preset discovery, state conversion, invalidation)
//! are supplied by collaborators and only routed here by id.

use std::ffi::{CStr, c_char, c_void};
use std::ptr;

use clapshim_core::abi::{
    CLAP_PLUGIN_INVALIDATION_FACTORY_ID, CLAP_PLUGIN_STATE_CONVERTER_FACTORY_ID,
    CLAP_PRESET_DISCOVERY_FACTORY_ID, CLAP_PRESET_DISCOVERY_FACTORY_ID_COMPAT, RawHost,
    RawPlugin, RawPluginDescriptor, RawPluginFactory,
};
use strum::Display;
use tracing::warn;

use crate::bridge::Bridge;
use crate::instance::InstanceRecord;

/// Kinds of auxiliary factory a collaborator can register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum AuxiliaryKind {
    PresetDiscovery,
    StateConverter,
    Invalidation,
}

impl AuxiliaryKind {
    /// Factory ids this kind answers to.
    pub fn ids(self) -> &'static [&'static CStr] {
        match self {
            AuxiliaryKind::PresetDiscovery => &[
                CLAP_PRESET_DISCOVERY_FACTORY_ID,
                CLAP_PRESET_DISCOVERY_FACTORY_ID_COMPAT,
            ],
            AuxiliaryKind::StateConverter => &[CLAP_PLUGIN_STATE_CONVERTER_FACTORY_ID],
            AuxiliaryKind::Invalidation => &[CLAP_PLUGIN_INVALIDATION_FACTORY_ID],
        }
    }

    pub fn answers(self, id: &CStr) -> bool {
        self.ids().iter().any(|known| *known == id)
    }
}

/// A factory table owned by a collaborator and served from `get_factory`.
pub trait AuxiliaryFactory: Send + Sync {
    fn kind(&self) -> AuxiliaryKind;

    /// The protocol factory table. Must stay valid while the bridge lives.
    fn table(&self) -> *const c_void;
}

/// `clap_plugin_factory_t` followed by its owning bridge.
#[repr(C)]
pub(crate) struct FactoryTable {
    raw: RawPluginFactory,
    bridge: *const Bridge,
}

// SAFETY: the bridge pointer is set once before the table is published and
// the bridge itself is Sync.
unsafe impl Send for FactoryTable {}
unsafe impl Sync for FactoryTable {}

impl FactoryTable {
    /// A table not yet bound to a bridge; every call answers neutrally.
    pub(crate) fn unbound() -> Self {
        Self {
            raw: RawPluginFactory {
                get_plugin_count: Some(get_plugin_count),
                get_plugin_descriptor: Some(get_plugin_descriptor),
                create_plugin: Some(create_plugin),
            },
            bridge: ptr::null(),
        }
    }

    pub(crate) fn bind(&mut self, bridge: *const Bridge) {
        self.bridge = bridge;
    }

    pub(crate) fn as_raw(&self) -> *const RawPluginFactory {
        &self.raw
    }
}

/// # Safety
///
/// `factory` must be null or point at a live [`FactoryTable`].
unsafe fn bridge_of<'a>(factory: *const RawPluginFactory) -> Option<&'a Bridge> {
    // SAFETY: `raw` is the first field of the repr(C) table, and a bound
    // bridge outlives every table it owns.
    unsafe {
        let table = factory.cast::<FactoryTable>().as_ref()?;
        table.bridge.as_ref()
    }
}

unsafe extern "C" fn get_plugin_count(factory: *const RawPluginFactory) -> u32 {
    unsafe { bridge_of(factory) }.map_or(0, |bridge| bridge.plugin_count())
}

unsafe extern "C" fn get_plugin_descriptor(
    factory: *const RawPluginFactory,
    index: u32,
) -> *const RawPluginDescriptor {
    unsafe { bridge_of(factory) }
        .and_then(|bridge| bridge.descriptor(index))
        .unwrap_or(ptr::null())
}

unsafe extern "C" fn create_plugin(
    factory: *const RawPluginFactory,
    host: *const RawHost,
    plugin_id: *const c_char,
) -> *const RawPlugin {
    let Some(bridge) = (unsafe { bridge_of(factory) }) else {
        return ptr::null();
    };
    if plugin_id.is_null() {
        return ptr::null();
    }
    // SAFETY: the host passes a NUL-terminated plugin id.
    let id = unsafe { CStr::from_ptr(plugin_id) };
    match bridge.create_instance(host, id) {
        Ok(record) => InstanceRecord::into_raw(record),
        Err(e) => {
            warn!(plugin = %id.to_string_lossy(), error = %e, "create_plugin failed");
            ptr::null()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_discovery_answers_both_ids() {
        assert!(AuxiliaryKind::PresetDiscovery.answers(CLAP_PRESET_DISCOVERY_FACTORY_ID));
        assert!(AuxiliaryKind::PresetDiscovery.answers(CLAP_PRESET_DISCOVERY_FACTORY_ID_COMPAT));
        assert!(!AuxiliaryKind::PresetDiscovery.answers(CLAP_PLUGIN_INVALIDATION_FACTORY_ID));
    }

    #[test]
    fn unbound_table_answers_neutrally() {
        let table = FactoryTable::unbound();
        unsafe {
            assert_eq!(get_plugin_count(table.as_raw()), 0);
            assert!(get_plugin_descriptor(table.as_raw(), 0).is_null());
            assert!(create_plugin(table.as_raw(), ptr::null(), c"x".as_ptr()).is_null());
            assert_eq!(get_plugin_count(ptr::null()), 0);
        }
    }
}
