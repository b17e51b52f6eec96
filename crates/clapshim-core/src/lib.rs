// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for clapshim.
//!
//! This crate provides the error type shared across the workspace, the
//! catalogue of optional protocol extensions with its capability map, and
//! the `#[repr(C)]` mirror of the protocol structures the bridge exchanges
//! with hosts.

pub mod abi;
pub mod error;
pub mod extension;

pub use error::ShimError;
pub use extension::{CapabilitySet, Extension};

/// Version of the module-side entry point convention this bridge drives.
///
/// Modules exporting `clapshim_get_version` must report the same major.
pub const MODULE_API_VERSION: semver::Version = semver::Version::new(0, 2, 0);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_renders_and_classifies() {
        use std::path::PathBuf;

        // (error, rendered message, is_discovery, is_resolution)
        let cases = [
            (
                ShimError::ManifestNotFound {
                    stem: "gain".into(),
                    searched: vec![PathBuf::from("/plugins/gain.json")],
                },
                r#"no manifest found for gain (searched ["/plugins/gain.json"])"#,
                true,
                false,
            ),
            (
                ShimError::Manifest {
                    path: "gain.json".into(),
                    message: "bad".into(),
                },
                "invalid manifest gain.json: bad",
                true,
                false,
            ),
            (
                ShimError::ModuleNotFound {
                    library: "libgain.so".into(),
                    searched: vec![],
                },
                "module library `libgain.so` not found (searched [])",
                false,
                true,
            ),
            (
                ShimError::Library {
                    path: "libgain.so".into(),
                    source: Box::new(std::io::Error::other("bad ELF header")),
                },
                "failed to load module library libgain.so: bad ELF header",
                false,
                true,
            ),
            (
                ShimError::MissingEntryPoints {
                    library: "libgain.so".into(),
                    missing: vec!["clapshim_plugin_process"],
                },
                "module `libgain.so` is missing mandatory entry points: clapshim_plugin_process",
                false,
                true,
            ),
            (
                ShimError::IncompatibleModule {
                    library: "libgain.so".into(),
                    found: semver::Version::new(1, 0, 0),
                    required: MODULE_API_VERSION,
                },
                "module `libgain.so` reports API 1.0.0, bridge requires 0.2.0",
                false,
                true,
            ),
            (
                ShimError::Descriptor {
                    plugin: "com.example.gain".into(),
                    reason: "interior NUL".into(),
                },
                "cannot synthesize descriptor for com.example.gain: interior NUL",
                false,
                false,
            ),
            (
                ShimError::PluginNotFound("com.example.delay".into()),
                "plugin not found: com.example.delay",
                false,
                false,
            ),
            (
                ShimError::CreationFailed {
                    plugin: "com.example.gain".into(),
                },
                "module constructor for com.example.gain returned null",
                false,
                false,
            ),
            (
                ShimError::InvalidTransition {
                    call: "process",
                    state: "Created".into(),
                },
                "process is not valid in state Created",
                false,
                false,
            ),
            (
                ShimError::Config("bad level".into()),
                "configuration error: bad level",
                false,
                false,
            ),
            (
                ShimError::Internal("poisoned".into()),
                "internal error: poisoned",
                false,
                false,
            ),
        ];

        for (error, message, discovery, resolution) in cases {
            assert_eq!(error.to_string(), message);
            assert_eq!(error.is_discovery(), discovery, "{error:?}");
            assert_eq!(error.is_resolution(), resolution, "{error:?}");
        }
    }

    #[test]
    fn error_classes() {
        let missing = ShimError::MissingEntryPoints {
            library: "libgain.so".into(),
            missing: vec!["clapshim_plugin_init", "clapshim_plugin_process"],
        };
        assert!(missing.is_resolution());
        assert!(!missing.is_discovery());
        assert_eq!(
            missing.to_string(),
            "module `libgain.so` is missing mandatory entry points: clapshim_plugin_init, clapshim_plugin_process"
        );

        let manifest = ShimError::Manifest {
            path: "gain.json".into(),
            message: "plugin.id must not be empty".into(),
        };
        assert!(manifest.is_discovery());
        assert!(!manifest.is_resolution());
    }

    #[test]
    fn extension_serialization() {
        let json = serde_json::to_string(&Extension::AudioPortsConfig).expect("should serialize");
        assert_eq!(json, "\"audio-ports-config\"");
        let parsed: Extension = serde_json::from_str(&json).expect("should deserialize");
        assert_eq!(parsed, Extension::AudioPortsConfig);
    }
}
