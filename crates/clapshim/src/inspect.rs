// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `clapshim inspect` command implementation.
//!
//! Runs manifest discovery and module resolution for a bundle the way the
//! exported entry does, then prints one line per optional extension.

use std::fmt::Write as _;
use std::path::Path;

use clapshim_config::ClapshimConfig;
use clapshim_core::{CapabilitySet, Extension, ShimError};
use clapshim_manifest::{Manifest, ManifestStore};
use clapshim_module::{DylibLoader, ModuleHandle, ModuleLoader, ResolvePolicy};
use strum::IntoEnumIterator;

/// Resolve the module behind `plugin_path` and print its capability map.
pub fn run_inspect(plugin_path: &Path, config: &ClapshimConfig) -> Result<(), ShimError> {
    let fallback_dirs = config.fallback_dirs();
    let manifest = ManifestStore::new(fallback_dirs.clone()).discover(plugin_path)?;
    let plugin_dir = plugin_path.parent().unwrap_or(Path::new("."));
    let loader = DylibLoader::new(
        fallback_dirs,
        ResolvePolicy {
            check_api_version: config.module.check_api_version,
        },
    );
    let handle = loader.load(&manifest, plugin_dir)?;
    print!("{}", render_capabilities(&manifest, &handle));
    Ok(())
}

/// Capability report for a resolved module.
pub fn render_capabilities(manifest: &Manifest, handle: &ModuleHandle) -> String {
    let entry_points = handle.entry_points();
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", manifest.id(), handle.name());
    let _ = writeln!(out, "{}", "-".repeat(40));
    let _ = writeln!(
        out,
        "main-thread callback: {}",
        yes_no(entry_points.main_thread.is_some())
    );
    let _ = writeln!(out, "version probe: {}", yes_no(entry_points.version.is_some()));
    let _ = writeln!(out);
    out.push_str(&capability_table(handle.capabilities(), &manifest.declared_extensions()));
    out
}

/// One line per extension: exported mark, short name, notes on how the
/// manifest's declaration compares.
pub fn capability_table(capabilities: CapabilitySet, declared: &[Extension]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[x] {:<26} built-in", "audio-ports");
    for ext in Extension::iter() {
        let exported = capabilities.contains(ext);
        let is_declared = declared.contains(&ext);
        let note = match (exported, is_declared) {
            (true, false) if !declared.is_empty() => "not declared",
            (false, true) => "declared, not exported",
            _ => "",
        };
        let mark = if exported { "[x]" } else { "[ ]" };
        let line = format!("{mark} {:<26} {note}", ext.to_string());
        let _ = writeln!(out, "{}", line.trim_end());
    }
    out
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
