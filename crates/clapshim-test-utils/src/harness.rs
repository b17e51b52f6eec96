// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bridge harness for end-to-end tests.
//!
//! `BridgeHarness` assembles a [`Bridge`] over a [`StaticLoader`] serving
//! mock modules, wrapped in a [`CountingLoader`] so tests can assert how
//! often a module was resolved, plus a [`MockHost`] to create instances with.

use std::ffi::CString;
use std::sync::Arc;

use clapshim_bridge::{Bridge, InstanceRecord};
use clapshim_core::ShimError;
use clapshim_manifest::Manifest;
use clapshim_module::{ResolvePolicy, StaticLoader};

use crate::counting_loader::CountingLoader;
use crate::mock_module::{MockHost, MockModule};

/// Manifest document for a plugin served by `library`.
pub fn manifest_json(id: &str, library: &str) -> String {
    serde_json::json!({
        "schemaVersion": "1.0",
        "plugin": {
            "id": id,
            "name": "Gain",
            "vendor": "Example",
            "version": "1.0.0",
            "description": "Simple gain",
            "features": ["audio-effect", "stereo"]
        },
        "build": { "library": library },
        "extensions": [ { "id": "clap.params", "supported": true } ],
        "parameters": [
            { "id": 0, "name": "Gain", "minValue": 0.0, "maxValue": 2.0, "defaultValue": 1.0, "flags": [] }
        ]
    })
    .to_string()
}

/// Builder for creating test bridges with configurable modules.
pub struct BridgeHarnessBuilder {
    plugins: Vec<(String, MockModule)>,
    manifests: Vec<Manifest>,
    policy: ResolvePolicy,
}

impl BridgeHarnessBuilder {
    fn new() -> Self {
        Self {
            plugins: Vec::new(),
            manifests: Vec::new(),
            policy: ResolvePolicy::default(),
        }
    }

    /// Register plugin `id` backed by `module`.
    pub fn with_plugin(mut self, id: &str, module: MockModule) -> Self {
        self.plugins.push((id.to_string(), module));
        self
    }

    /// Register an extra manifest as-is (its library must be served by an
    /// earlier plugin's module).
    pub fn with_manifest(mut self, manifest: Manifest) -> Self {
        self.manifests.push(manifest);
        self
    }

    /// Turn the module API version check on or off.
    pub fn with_version_check(mut self, check_api_version: bool) -> Self {
        self.policy = ResolvePolicy { check_api_version };
        self
    }

    /// Build the harness. Each plugin gets its own library name.
    pub fn build(self) -> Result<BridgeHarness, ShimError> {
        let mut loader = StaticLoader::new(self.policy);
        let mut builder = Bridge::builder();
        for (id, module) in self.plugins {
            let library = format!("lib{id}.so");
            let manifest = Manifest::load(&manifest_json(&id, &library))?;
            loader = loader.with_unit(library, module.into_unit());
            builder = builder.manifest(manifest, "/test/bundle");
        }
        for manifest in self.manifests {
            builder = builder.manifest(manifest, "/test/bundle");
        }

        let loader = Arc::new(CountingLoader::new(loader));
        let bridge = builder.loader(loader.clone()).build()?;
        Ok(BridgeHarness {
            bridge,
            loader,
            host: Box::new(MockHost::new()),
        })
    }
}

/// A bridge over mock modules, with a host to create instances for.
pub struct BridgeHarness {
    /// The bridge under test.
    pub bridge: Box<Bridge>,
    /// Loader counting module resolutions.
    pub loader: Arc<CountingLoader<StaticLoader>>,
    /// Host pointer passed to every instance; counts live instances.
    pub host: Box<MockHost>,
}

impl BridgeHarness {
    pub fn builder() -> BridgeHarnessBuilder {
        BridgeHarnessBuilder::new()
    }

    /// Create an instance of plugin `id` through the bridge.
    pub fn create(&self, id: &str) -> Result<Box<InstanceRecord>, ShimError> {
        let id = CString::new(id).map_err(|e| ShimError::Internal(e.to_string()))?;
        self.bridge.create_instance(self.host.as_raw(), &id)
    }

    /// Module resolutions performed so far.
    pub fn loads(&self) -> usize {
        self.loader.loads()
    }
}
