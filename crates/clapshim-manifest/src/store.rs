// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Manifest discovery on disk.
//!
//! A bundle `/path/to/gain.clap` is described by `gain.json`, looked up
//! first next to the bundle and then in each fallback directory in order.
//! The first file that exists wins, even if it later fails to parse.

use std::path::{Path, PathBuf};

use clapshim_core::ShimError;
use tracing::{debug, info};

use crate::manifest::{Manifest, parse_manifest};

/// Finds and loads manifests for plugin bundles.
#[derive(Debug, Clone, Default)]
pub struct ManifestStore {
    fallback_dirs: Vec<PathBuf>,
}

impl ManifestStore {
    /// Create a store that searches `fallback_dirs` after the bundle's own
    /// directory.
    pub fn new(fallback_dirs: Vec<PathBuf>) -> Self {
        Self { fallback_dirs }
    }

    /// Manifest stem for a bundle path: the file name without `.clap`.
    pub fn stem(plugin_path: &Path) -> Option<String> {
        let name = plugin_path.file_name()?.to_str()?;
        let stem = name.strip_suffix(".clap").unwrap_or(name);
        (!stem.is_empty()).then(|| stem.to_string())
    }

    /// Candidate manifest paths for a bundle, in search order.
    pub fn candidates(&self, plugin_path: &Path) -> Vec<PathBuf> {
        let Some(stem) = Self::stem(plugin_path) else {
            return Vec::new();
        };
        let file = format!("{stem}.json");
        plugin_path
            .parent()
            .into_iter()
            .chain(self.fallback_dirs.iter().map(PathBuf::as_path))
            .map(|dir| dir.join(&file))
            .collect()
    }

    /// Locate the manifest document for a bundle. Zero or one match.
    pub fn find(&self, plugin_path: &Path) -> Option<PathBuf> {
        let found = self
            .candidates(plugin_path)
            .into_iter()
            .find(|candidate| candidate.is_file());
        match &found {
            Some(path) => debug!(manifest = %path.display(), "manifest found"),
            None => debug!(plugin = %plugin_path.display(), "no manifest in any search location"),
        }
        found
    }

    /// Find and load the manifest for a bundle.
    pub fn discover(&self, plugin_path: &Path) -> Result<Manifest, ShimError> {
        let path = self
            .find(plugin_path)
            .ok_or_else(|| ShimError::ManifestNotFound {
                stem: Self::stem(plugin_path).unwrap_or_default(),
                searched: self.candidates(plugin_path),
            })?;
        let manifest = load_file(&path)?;
        info!(plugin = %manifest.id(), manifest = %path.display(), "manifest loaded");
        Ok(manifest)
    }
}

/// Read and validate a manifest file.
pub fn load_file(path: &Path) -> Result<Manifest, ShimError> {
    let origin = path.display().to_string();
    let json = std::fs::read_to_string(path).map_err(|e| ShimError::Manifest {
        path: origin.clone(),
        message: format!("cannot read: {e}"),
    })?;
    parse_manifest(&json, &origin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_strips_clap_suffix() {
        assert_eq!(
            ManifestStore::stem(Path::new("/p/gain.clap")).as_deref(),
            Some("gain")
        );
        assert_eq!(
            ManifestStore::stem(Path::new("/p/libgain.so")).as_deref(),
            Some("libgain.so")
        );
        assert_eq!(ManifestStore::stem(Path::new("/")), None);
    }

    #[test]
    fn candidates_are_bundle_dir_then_fallbacks() {
        let store = ManifestStore::new(vec![
            PathBuf::from("/home/u/.clap/manifests"),
            PathBuf::from("/home/u/.clap"),
        ]);
        assert_eq!(
            store.candidates(Path::new("/plugins/gain.clap")),
            vec![
                PathBuf::from("/plugins/gain.json"),
                PathBuf::from("/home/u/.clap/manifests/gain.json"),
                PathBuf::from("/home/u/.clap/gain.json"),
            ]
        );
    }
}
