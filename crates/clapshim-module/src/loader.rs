// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Module loaders: from a shared library on disk, or from units linked
//! into the bridge itself.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clapshim_core::ShimError;
use clapshim_manifest::Manifest;
use tracing::debug;

use crate::entry_points::EntryPoints;
use crate::handle::{ModuleHandle, ResolvePolicy};
use crate::symbols::{DynamicLibrary, ExportTable};

/// Turns a manifest's module location into a resolved [`ModuleHandle`].
pub trait ModuleLoader: Send + Sync {
    /// Locate, load, and resolve the module for `manifest`.
    ///
    /// `plugin_dir` is the directory of the bundle the manifest belongs to.
    fn load(&self, manifest: &Manifest, plugin_dir: &Path) -> Result<ModuleHandle, ShimError>;
}

/// Loads modules as shared libraries.
///
/// The library named in the manifest is looked up in the bundle directory,
/// then in each fallback directory. A bare name without an extension is
/// also tried in its platform form (`gain` -> `libgain.so`).
#[derive(Debug, Clone, Default)]
pub struct DylibLoader {
    fallback_dirs: Vec<PathBuf>,
    policy: ResolvePolicy,
}

impl DylibLoader {
    pub fn new(fallback_dirs: Vec<PathBuf>, policy: ResolvePolicy) -> Self {
        Self {
            fallback_dirs,
            policy,
        }
    }

    /// Candidate library paths, in search order.
    pub fn candidates(&self, library: &str, plugin_dir: &Path) -> Vec<PathBuf> {
        let mut names = vec![PathBuf::from(library)];
        if Path::new(library).extension().is_none() {
            names.push(PathBuf::from(libloading::library_filename(library)));
        }
        std::iter::once(plugin_dir)
            .chain(self.fallback_dirs.iter().map(PathBuf::as_path))
            .flat_map(|dir| names.iter().map(move |name| dir.join(name)))
            .collect()
    }

    /// First existing candidate, if any.
    pub fn locate(&self, library: &str, plugin_dir: &Path) -> Result<PathBuf, ShimError> {
        let candidates = self.candidates(library, plugin_dir);
        candidates
            .iter()
            .find(|path| path.is_file())
            .cloned()
            .ok_or_else(|| ShimError::ModuleNotFound {
                library: library.to_string(),
                searched: candidates,
            })
    }
}

impl ModuleLoader for DylibLoader {
    fn load(&self, manifest: &Manifest, plugin_dir: &Path) -> Result<ModuleHandle, ShimError> {
        let path = self.locate(&manifest.build.library, plugin_dir)?;
        debug!(plugin = %manifest.id(), library = %path.display(), "loading module library");
        // SAFETY: modules are trusted code installed alongside their manifest.
        let library = unsafe { DynamicLibrary::open(&path)? };
        ModuleHandle::resolve(Arc::new(library), self.policy)
    }
}

/// A module unit compiled into the bridge binary.
#[derive(Debug, Clone)]
pub enum StaticUnit {
    /// Resolved by name, exactly like a shared library.
    Exports(Arc<ExportTable>),
    /// Already typed; no name lookup at all.
    Typed(EntryPoints),
}

/// Serves modules that are linked in rather than loaded.
///
/// Units are keyed by the manifest's library name. A default unit, if set,
/// answers for any library name, which is how a single-plugin static build
/// makes location always succeed.
#[derive(Debug, Clone, Default)]
pub struct StaticLoader {
    units: HashMap<String, StaticUnit>,
    default_unit: Option<StaticUnit>,
    policy: ResolvePolicy,
}

impl StaticLoader {
    pub fn new(policy: ResolvePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// A loader answering every manifest with `unit`, resolved under
    /// `policy`.
    pub fn single(unit: StaticUnit, policy: ResolvePolicy) -> Self {
        Self {
            default_unit: Some(unit),
            policy,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_unit(mut self, library: impl Into<String>, unit: StaticUnit) -> Self {
        self.units.insert(library.into(), unit);
        self
    }
}

impl ModuleLoader for StaticLoader {
    fn load(&self, manifest: &Manifest, _plugin_dir: &Path) -> Result<ModuleHandle, ShimError> {
        let library = &manifest.build.library;
        let unit = self
            .units
            .get(library)
            .or(self.default_unit.as_ref())
            .ok_or_else(|| ShimError::ModuleNotFound {
                library: library.clone(),
                searched: Vec::new(),
            })?;
        match unit {
            StaticUnit::Exports(table) => ModuleHandle::resolve(table.clone(), self.policy),
            StaticUnit::Typed(entry_points) => {
                ModuleHandle::from_entry_points(library.clone(), *entry_points, self.policy)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_library_name_gets_platform_form() {
        let loader = DylibLoader::new(vec![PathBuf::from("/opt/clap")], ResolvePolicy::default());
        let candidates = loader.candidates("gain", Path::new("/bundle"));
        assert_eq!(candidates.len(), 4);
        assert_eq!(candidates[0], PathBuf::from("/bundle/gain"));
        assert_eq!(
            candidates[1],
            Path::new("/bundle").join(libloading::library_filename("gain"))
        );
        assert_eq!(candidates[2], PathBuf::from("/opt/clap/gain"));
    }

    #[test]
    fn named_library_is_searched_verbatim() {
        let loader = DylibLoader::new(vec![PathBuf::from("/opt/clap")], ResolvePolicy::default());
        assert_eq!(
            loader.candidates("libgain.so", Path::new("/bundle")),
            vec![
                PathBuf::from("/bundle/libgain.so"),
                PathBuf::from("/opt/clap/libgain.so")
            ]
        );
    }

    #[test]
    fn missing_library_is_module_not_found() {
        let loader = DylibLoader::default();
        let err = loader
            .locate("libnothing.so", Path::new("/nonexistent"))
            .unwrap_err();
        assert!(matches!(err, ShimError::ModuleNotFound { ref searched, .. } if searched.len() == 1));
    }
}
