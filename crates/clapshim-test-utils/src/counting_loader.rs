// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A loader wrapper that counts resolutions.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use clapshim_core::ShimError;
use clapshim_manifest::Manifest;
use clapshim_module::{ModuleHandle, ModuleLoader};

/// Delegates to an inner loader and counts every `load` call.
pub struct CountingLoader<L> {
    inner: L,
    loads: AtomicUsize,
}

impl<L: ModuleLoader> CountingLoader<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            loads: AtomicUsize::new(0),
        }
    }

    /// Number of times a module was loaded through this loader.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl<L: ModuleLoader> ModuleLoader for CountingLoader<L> {
    fn load(&self, manifest: &Manifest, plugin_dir: &Path) -> Result<ModuleHandle, ShimError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.inner.load(manifest, plugin_dir)
    }
}
