// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin manifest documents.
//!
//! A manifest is a JSON document describing one installable plugin: its
//! identity, descriptor metadata, the module library implementing it, and
//! optional extension and parameter declarations.

use clapshim_core::{Extension, ShimError};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Upper bound on feature tags carried into a descriptor.
pub const MAX_FEATURES: usize = 32;

/// Upper bound on extension declarations kept from a manifest.
pub const MAX_EXTENSION_DECLS: usize = 64;

/// Upper bound on parameter declarations kept from a manifest.
pub const MAX_PARAMETERS: usize = 128;

/// A validated plugin manifest. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    #[serde(default)]
    pub plugin: PluginSection,
    #[serde(default)]
    pub build: BuildSection,
    #[serde(default)]
    pub extensions: Vec<ExtensionDecl>,
    #[serde(default)]
    pub parameters: Vec<ParameterDecl>,
}

fn default_schema_version() -> String {
    "1.0".to_string()
}

/// Identity and descriptor metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginSection {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub manual_url: Option<String>,
    #[serde(default)]
    pub support_url: Option<String>,
    /// Feature tags such as `audio-effect` or `stereo`.
    #[serde(default)]
    pub features: Vec<String>,
}

/// Where the implementation module lives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSection {
    /// Library file name, resolved against the bundle and installed dirs.
    #[serde(default)]
    pub library: String,
}

/// An extension the manifest claims the module does (or does not) support.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionDecl {
    pub id: String,
    #[serde(default = "default_supported")]
    pub supported: bool,
}

fn default_supported() -> bool {
    true
}

/// A parameter declaration, consumed by collaborators outside the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDecl {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub min_value: f64,
    #[serde(default = "default_max_value")]
    pub max_value: f64,
    #[serde(default)]
    pub default_value: f64,
    #[serde(default)]
    pub flags: Vec<String>,
}

fn default_max_value() -> f64 {
    1.0
}

/// Parse and validate a manifest document.
///
/// `origin` names the document in error messages (usually its path).
/// Required fields are `plugin.id`, `plugin.name`, `plugin.vendor`,
/// `plugin.version`, and `build.library`; all must be non-empty.
pub fn parse_manifest(json: &str, origin: &str) -> Result<Manifest, ShimError> {
    let invalid = |message: String| ShimError::Manifest {
        path: origin.to_string(),
        message,
    };

    let mut manifest: Manifest =
        serde_json::from_str(json).map_err(|e| invalid(format!("malformed JSON: {e}")))?;

    let required = [
        ("plugin.id", &manifest.plugin.id),
        ("plugin.name", &manifest.plugin.name),
        ("plugin.vendor", &manifest.plugin.vendor),
        ("plugin.version", &manifest.plugin.version),
        ("build.library", &manifest.build.library),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(invalid(format!("{field} must not be empty")));
        }
    }

    if manifest.plugin.features.len() > MAX_FEATURES {
        warn!(
            plugin = %manifest.plugin.id,
            count = manifest.plugin.features.len(),
            "too many feature tags, keeping the first {MAX_FEATURES}"
        );
        manifest.plugin.features.truncate(MAX_FEATURES);
    }
    if manifest.extensions.len() > MAX_EXTENSION_DECLS {
        warn!(
            plugin = %manifest.plugin.id,
            count = manifest.extensions.len(),
            "too many extension declarations, keeping the first {MAX_EXTENSION_DECLS}"
        );
        manifest.extensions.truncate(MAX_EXTENSION_DECLS);
    }
    // Ranges are carried as declared; the module owns parameter semantics.
    if manifest.parameters.len() > MAX_PARAMETERS {
        warn!(
            plugin = %manifest.plugin.id,
            count = manifest.parameters.len(),
            "too many parameter declarations, keeping the first {MAX_PARAMETERS}"
        );
        manifest.parameters.truncate(MAX_PARAMETERS);
    }

    Ok(manifest)
}

impl Manifest {
    /// Parse a manifest that has no file of origin.
    pub fn load(document: &str) -> Result<Manifest, ShimError> {
        parse_manifest(document, "<inline>")
    }

    pub fn id(&self) -> &str {
        &self.plugin.id
    }

    /// Extensions the manifest declares as supported.
    ///
    /// Unknown ids and the bridge-owned `clap.audio-ports` are skipped.
    pub fn declared_extensions(&self) -> Vec<Extension> {
        let mut declared: Vec<Extension> = self
            .extensions
            .iter()
            .filter(|decl| decl.supported)
            .filter_map(|decl| {
                let ext = Extension::from_id_str(&decl.id);
                if ext.is_none() && decl.id != "clap.audio-ports" {
                    warn!(plugin = %self.plugin.id, extension = %decl.id, "unknown extension id in manifest");
                }
                ext
            })
            .collect();
        declared.sort();
        declared.dedup();
        declared
    }
}
