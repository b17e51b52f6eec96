// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types shared by every clapshim crate.
//!
//! Nothing here ever crosses the C boundary. The exported entry points log
//! these errors and collapse them into the protocol's neutral return values.

use std::path::PathBuf;

use thiserror::Error;

/// The primary error type for discovery, resolution, and instance creation.
#[derive(Debug, Error)]
pub enum ShimError {
    /// No manifest document exists for a plugin bundle in any search location.
    #[error("no manifest found for {stem} (searched {searched:?})")]
    ManifestNotFound { stem: String, searched: Vec<PathBuf> },

    /// A manifest document was found but is malformed or incomplete.
    #[error("invalid manifest {path}: {message}")]
    Manifest { path: String, message: String },

    /// The module library named by a manifest could not be located.
    #[error("module library `{library}` not found (searched {searched:?})")]
    ModuleNotFound {
        library: String,
        searched: Vec<PathBuf>,
    },

    /// The module library exists but the dynamic loader rejected it.
    #[error("failed to load module library {path}: {source}")]
    Library {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// One or more mandatory entry points are missing from the module.
    #[error("module `{library}` is missing mandatory entry points: {}", missing.join(", "))]
    MissingEntryPoints {
        library: String,
        missing: Vec<&'static str>,
    },

    /// The module reports an API version the bridge cannot drive.
    #[error("module `{library}` reports API {found}, bridge requires {required}")]
    IncompatibleModule {
        library: String,
        found: semver::Version,
        required: semver::Version,
    },

    /// Descriptor synthesis failed; nothing was handed to the host.
    #[error("cannot synthesize descriptor for {plugin}: {reason}")]
    Descriptor { plugin: String, reason: String },

    /// The host asked for a plugin id that is not registered.
    #[error("plugin not found: {0}")]
    PluginNotFound(String),

    /// The module constructor returned a null instance.
    #[error("module constructor for {plugin} returned null")]
    CreationFailed { plugin: String },

    /// A lifecycle call arrived in a state that does not permit it.
    #[error("{call} is not valid in state {state}")]
    InvalidTransition { call: &'static str, state: String },

    /// Configuration errors (invalid TOML, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ShimError {
    /// Discovery errors drop the plugin entry before it reaches the registry.
    pub fn is_discovery(&self) -> bool {
        matches!(
            self,
            ShimError::ManifestNotFound { .. } | ShimError::Manifest { .. }
        )
    }

    /// Resolution errors make a registered entry permanently uninstantiable.
    pub fn is_resolution(&self) -> bool {
        matches!(
            self,
            ShimError::ModuleNotFound { .. }
                | ShimError::Library { .. }
                | ShimError::MissingEntryPoints { .. }
                | ShimError::IncompatibleModule { .. }
        )
    }
}
