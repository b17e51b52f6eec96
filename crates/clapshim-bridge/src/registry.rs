// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin registry.
//!
//! An ordered list of manifest entries, each carrying its synthesized
//! descriptor and, once the first instance is requested, the resolved
//! module handle shared by every instance of that plugin.

use std::ffi::CStr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use clapshim_core::{CapabilitySet, Extension, ShimError};
use clapshim_manifest::{Descriptor, Manifest};
use clapshim_module::{ModuleHandle, ModuleLoader};
use tracing::{error, info, warn};

/// Resolution outcome cached per entry. Failures are remembered as text so
/// a broken module is not reloaded on every create request.
type ModuleSlot = Option<Result<Arc<ModuleHandle>, String>>;

/// One installable plugin known to the bridge.
pub struct PluginEntry {
    manifest: Manifest,
    descriptor: Descriptor,
    plugin_dir: PathBuf,
    module: Mutex<ModuleSlot>,
}

impl PluginEntry {
    /// Synthesize the descriptor for `manifest`. Nothing is kept on failure.
    pub fn new(manifest: Manifest, plugin_dir: impl Into<PathBuf>) -> Result<Self, ShimError> {
        let descriptor = Descriptor::synthesize(&manifest)?;
        Ok(Self {
            manifest,
            descriptor,
            plugin_dir: plugin_dir.into(),
            module: Mutex::new(None),
        })
    }

    pub fn id(&self) -> &str {
        self.manifest.id()
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    pub fn plugin_dir(&self) -> &Path {
        &self.plugin_dir
    }

    /// The module handle, resolving it on first use.
    ///
    /// Every caller after the first gets the same handle (or the same
    /// failure) without touching the loader again.
    pub fn module(&self, loader: &dyn ModuleLoader) -> Result<Arc<ModuleHandle>, ShimError> {
        let mut slot = self
            .module
            .lock()
            .map_err(|_| ShimError::Internal(format!("module slot for {} poisoned", self.id())))?;

        match &*slot {
            Some(Ok(handle)) => return Ok(Arc::clone(handle)),
            Some(Err(reason)) => {
                return Err(ShimError::Internal(format!(
                    "module for {} failed to resolve earlier: {reason}",
                    self.id()
                )));
            }
            None => {}
        }

        match loader.load(&self.manifest, &self.plugin_dir) {
            Ok(handle) => {
                let handle = Arc::new(handle);
                report_declaration_mismatch(&self.manifest, handle.capabilities());
                info!(plugin = %self.id(), module = %handle.name(), "module bound to plugin");
                *slot = Some(Ok(Arc::clone(&handle)));
                Ok(handle)
            }
            Err(e) => {
                error!(plugin = %self.id(), error = %e, "module resolution failed");
                *slot = Some(Err(e.to_string()));
                Err(e)
            }
        }
    }

    /// The resolved handle, if resolution already happened and succeeded.
    pub fn resolved_module(&self) -> Option<Arc<ModuleHandle>> {
        let slot = self.module.lock().ok()?;
        match &*slot {
            Some(Ok(handle)) => Some(Arc::clone(handle)),
            _ => None,
        }
    }
}

impl std::fmt::Debug for PluginEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginEntry")
            .field("id", &self.id())
            .field("plugin_dir", &self.plugin_dir)
            .field("resolved", &self.resolved_module().is_some())
            .finish()
    }
}

/// Symbols decide; the manifest only gets a warning when it disagrees.
fn report_declaration_mismatch(manifest: &Manifest, resolved: CapabilitySet) {
    let declared: CapabilitySet = manifest.declared_extensions().into_iter().collect();
    let missing: Vec<Extension> = declared.iter().filter(|ext| !resolved.contains(*ext)).collect();
    let undeclared: Vec<Extension> = resolved.iter().filter(|ext| !declared.contains(*ext)).collect();

    if !missing.is_empty() {
        warn!(
            plugin = %manifest.id(),
            extensions = ?missing,
            "manifest declares extensions the module does not export; they stay unsupported"
        );
    }
    if !declared.is_empty() && !undeclared.is_empty() {
        warn!(
            plugin = %manifest.id(),
            extensions = ?undeclared,
            "module exports extensions the manifest does not declare; they are exposed"
        );
    }
}

/// Ordered registry of plugin entries, fixed after bridge initialization.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    entries: Vec<Arc<PluginEntry>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a manifest. Duplicate ids are rejected and the registry is left
    /// unchanged.
    pub fn register(
        &mut self,
        manifest: Manifest,
        plugin_dir: impl Into<PathBuf>,
    ) -> Result<Arc<PluginEntry>, ShimError> {
        if self.get(manifest.id()).is_some() {
            return Err(ShimError::Manifest {
                path: manifest.id().to_string(),
                message: "duplicate plugin id".to_string(),
            });
        }
        let entry = Arc::new(PluginEntry::new(manifest, plugin_dir)?);
        info!(plugin = %entry.id(), index = self.entries.len(), "plugin registered");
        self.entries.push(Arc::clone(&entry));
        Ok(entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index` in registration order.
    pub fn at(&self, index: usize) -> Option<&Arc<PluginEntry>> {
        self.entries.get(index)
    }

    pub fn get(&self, id: &str) -> Option<&Arc<PluginEntry>> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    /// Lookup by the C string a host passes to `create_plugin`.
    pub fn get_by_cstr(&self, id: &CStr) -> Option<&Arc<PluginEntry>> {
        self.entries
            .iter()
            .find(|entry| entry.descriptor().id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<PluginEntry>> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(id: &str) -> Manifest {
        Manifest::load(&format!(
            r#"{{
                "plugin": {{ "id": "{id}", "name": "Gain", "vendor": "Example", "version": "1.0.0" }},
                "build": {{ "library": "libgain.so" }}
            }}"#
        ))
        .expect("valid manifest")
    }

    #[test]
    fn registration_keeps_insertion_order() {
        let mut registry = PluginRegistry::new();
        registry.register(manifest("com.example.b"), "/p").unwrap();
        registry.register(manifest("com.example.a"), "/p").unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.at(0).unwrap().id(), "com.example.b");
        assert_eq!(registry.at(1).unwrap().id(), "com.example.a");
        assert!(registry.at(2).is_none());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut registry = PluginRegistry::new();
        registry.register(manifest("com.example.gain"), "/p").unwrap();
        let err = registry
            .register(manifest("com.example.gain"), "/q")
            .unwrap_err();
        assert!(err.is_discovery());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.at(0).unwrap().plugin_dir(), Path::new("/p"));
    }

    #[test]
    fn lookup_by_c_string() {
        let mut registry = PluginRegistry::new();
        registry.register(manifest("com.example.gain"), "/p").unwrap();
        assert!(registry.get_by_cstr(c"com.example.gain").is_some());
        assert!(registry.get_by_cstr(c"com.example.other").is_none());
    }
}
