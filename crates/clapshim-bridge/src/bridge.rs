// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The owned bridge: registry, loader, and factories in one value.

use std::ffi::{CStr, c_void};
use std::path::{Path, PathBuf};
use std::ptr;
use std::sync::Arc;

use clapshim_config::ClapshimConfig;
use clapshim_core::ShimError;
use clapshim_core::abi::{CLAP_PLUGIN_FACTORY_ID, RawHost, RawPluginDescriptor};
use clapshim_manifest::{Manifest, ManifestStore};
use clapshim_module::{DylibLoader, ModuleLoader, ResolvePolicy};
use tracing::{debug, info, warn};

use crate::factory::{AuxiliaryFactory, FactoryTable};
use crate::instance::InstanceRecord;
use crate::registry::PluginRegistry;

/// Everything the exported entry serves between `init` and `deinit`.
///
/// Always boxed: the factory table points back at the bridge, so the bridge
/// must not move once built.
pub struct Bridge {
    registry: PluginRegistry,
    loader: Arc<dyn ModuleLoader>,
    auxiliary: Vec<Box<dyn AuxiliaryFactory>>,
    factory: FactoryTable,
}

impl Bridge {
    pub fn builder() -> BridgeBuilder {
        BridgeBuilder::default()
    }

    /// Bridge for one plugin bundle, discovered on disk.
    ///
    /// Finds the bundle's manifest next to it or under the installed root
    /// and loads its module from the same places.
    pub fn from_bundle(plugin_path: &Path, config: &ClapshimConfig) -> Result<Box<Bridge>, ShimError> {
        let fallback_dirs = config.fallback_dirs();
        let manifest = ManifestStore::new(fallback_dirs.clone()).discover(plugin_path)?;
        let plugin_dir = plugin_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        let loader = DylibLoader::new(
            fallback_dirs,
            ResolvePolicy {
                check_api_version: config.module.check_api_version,
            },
        );
        Bridge::builder()
            .loader(Arc::new(loader))
            .manifest(manifest, plugin_dir)
            .build()
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn plugin_count(&self) -> u32 {
        u32::try_from(self.registry.len()).unwrap_or(u32::MAX)
    }

    /// Descriptor of the plugin at `index`, in registration order.
    pub fn descriptor(&self, index: u32) -> Option<*const RawPluginDescriptor> {
        let entry = self.registry.at(usize::try_from(index).ok()?)?;
        Some(entry.descriptor().as_raw())
    }

    /// Create an instance of plugin `id`.
    ///
    /// The first instance of a plugin resolves its module; later instances
    /// reuse the handle.
    pub fn create_instance(
        &self,
        host: *const RawHost,
        id: &CStr,
    ) -> Result<Box<InstanceRecord>, ShimError> {
        let entry = self
            .registry
            .get_by_cstr(id)
            .ok_or_else(|| ShimError::PluginNotFound(id.to_string_lossy().into_owned()))?;
        let module = entry.module(self.loader.as_ref())?;
        InstanceRecord::create(Arc::clone(entry), module, host)
    }

    /// Factory table for `id`, or null.
    pub fn factory(&self, id: &CStr) -> *const c_void {
        if id == CLAP_PLUGIN_FACTORY_ID {
            return self.factory.as_raw().cast();
        }
        match self.auxiliary.iter().find(|aux| aux.kind().answers(id)) {
            Some(aux) => aux.table(),
            None => {
                debug!(factory = %id.to_string_lossy(), "unknown factory requested");
                ptr::null()
            }
        }
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("registry", &self.registry)
            .field("auxiliary", &self.auxiliary.len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Bridge`].
#[derive(Default)]
pub struct BridgeBuilder {
    loader: Option<Arc<dyn ModuleLoader>>,
    manifests: Vec<(Manifest, PathBuf)>,
    auxiliary: Vec<Box<dyn AuxiliaryFactory>>,
}

impl BridgeBuilder {
    /// Module loader. Defaults to a [`DylibLoader`] with no fallback dirs.
    pub fn loader(mut self, loader: Arc<dyn ModuleLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Register a plugin, in order.
    pub fn manifest(mut self, manifest: Manifest, plugin_dir: impl Into<PathBuf>) -> Self {
        self.manifests.push((manifest, plugin_dir.into()));
        self
    }

    pub fn auxiliary(mut self, factory: Box<dyn AuxiliaryFactory>) -> Self {
        self.auxiliary.push(factory);
        self
    }

    /// Build the bridge.
    ///
    /// A manifest whose descriptor cannot be synthesized, or whose id is
    /// already taken, is dropped with a warning. Building fails only when
    /// no plugin survives.
    pub fn build(self) -> Result<Box<Bridge>, ShimError> {
        let mut registry = PluginRegistry::new();
        let mut last_error = None;
        for (manifest, plugin_dir) in self.manifests {
            let id = manifest.id().to_string();
            if let Err(e) = registry.register(manifest, plugin_dir) {
                warn!(plugin = %id, error = %e, "plugin entry dropped");
                last_error = Some(e);
            }
        }
        if registry.is_empty()
            && let Some(e) = last_error
        {
            return Err(e);
        }

        let mut bridge = Box::new(Bridge {
            registry,
            loader: self
                .loader
                .unwrap_or_else(|| Arc::new(DylibLoader::default())),
            auxiliary: self.auxiliary,
            factory: FactoryTable::unbound(),
        });
        let bridge_ptr: *const Bridge = &*bridge;
        bridge.factory.bind(bridge_ptr);
        info!(plugins = bridge.registry.len(), "bridge ready");
        Ok(bridge)
    }
}
