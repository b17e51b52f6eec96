// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Manifest store and descriptor synthesizer.
//!
//! Every plugin the bridge exposes is described by a JSON manifest. The
//! store finds that document for a bundle path and validates it at load
//! time; the synthesizer turns it into the host-facing descriptor.

pub mod descriptor;
pub mod manifest;
pub mod store;

pub use descriptor::{DEFAULT_FEATURES, Descriptor};
pub use manifest::{BuildSection, ExtensionDecl, Manifest, ParameterDecl, PluginSection, parse_manifest};
pub use store::{ManifestStore, load_file};
