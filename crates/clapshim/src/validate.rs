// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `clapshim validate` command implementation.

use std::ffi::CStr;
use std::fmt::Write as _;
use std::path::Path;

use clapshim_core::ShimError;
use clapshim_manifest::{Descriptor, Manifest, load_file};

/// Load a manifest, synthesize its descriptor and print both.
pub fn run_validate(path: &Path) -> Result<(), ShimError> {
    let manifest = load_file(path)?;
    let descriptor = Descriptor::synthesize(&manifest)?;
    print!("{}", render_descriptor(&manifest, &descriptor));
    Ok(())
}

/// Human-readable view of a descriptor and the manifest parts the bridge
/// uses at runtime.
pub fn render_descriptor(manifest: &Manifest, descriptor: &Descriptor) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", text(descriptor.id()));
    let _ = writeln!(out, "{}", "-".repeat(40));

    row(&mut out, "name", &text(descriptor.name()));
    row(&mut out, "vendor", &text(descriptor.vendor()));
    row(&mut out, "version", &text(descriptor.version()));
    row(&mut out, "description", &text(descriptor.description()));
    for (label, url) in [
        ("url", descriptor.url()),
        ("manual", descriptor.manual_url()),
        ("support", descriptor.support_url()),
    ] {
        if let Some(url) = url {
            row(&mut out, label, &text(url));
        }
    }

    let features: Vec<String> = descriptor.features().map(text).collect();
    row(&mut out, "features", &features.join(", "));
    row(&mut out, "library", &manifest.build.library);

    let declared: Vec<String> = manifest
        .declared_extensions()
        .iter()
        .map(ToString::to_string)
        .collect();
    row(&mut out, "extensions", &or_dash(declared.join(", ")));

    if manifest.parameters.is_empty() {
        row(&mut out, "parameters", "-");
    }
    for (i, param) in manifest.parameters.iter().enumerate() {
        let label = if i == 0 { "parameters" } else { "" };
        let value = format!(
            "{} #{} [{}, {}] default {}",
            param.name, param.id, param.min_value, param.max_value, param.default_value
        );
        row(&mut out, label, &value);
    }
    out
}

fn row(out: &mut String, label: &str, value: &str) {
    let _ = writeln!(out, "{label:<12} {value}");
}

fn text(value: &CStr) -> String {
    value.to_string_lossy().into_owned()
}

fn or_dash(value: String) -> String {
    if value.is_empty() { "-".to_string() } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clapshim_test_utils::manifest_json;

    #[test]
    fn renders_the_synthesized_descriptor() {
        let manifest = Manifest::load(&manifest_json("com.example.gain", "libgain.so")).unwrap();
        let descriptor = Descriptor::synthesize(&manifest).unwrap();
        insta::assert_snapshot!(render_descriptor(&manifest, &descriptor), @r"
        com.example.gain
        ----------------------------------------
        name         Gain
        vendor       Example
        version      1.0.0
        description  Simple gain
        features     audio-effect, stereo
        library      libgain.so
        extensions   params
        parameters   Gain #0 [0, 2] default 1
        ");
    }

    #[test]
    fn missing_manifest_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_validate(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ShimError::Manifest { .. }));
    }

    #[test]
    fn manifest_on_disk_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gain.json");
        std::fs::write(&path, manifest_json("com.example.gain", "libgain.so")).unwrap();
        assert!(run_validate(&path).is_ok());
    }
}
