// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Module resolver.
//!
//! Locates the implementation module a manifest names, resolves its
//! exported entry points by the `clapshim_<group>_<function>` convention,
//! and classifies each optional extension group as present or absent.
//! The result is an immutable [`ModuleHandle`] whose [`CapabilitySet`] is
//! computed exactly once.
//!
//! [`CapabilitySet`]: clapshim_core::CapabilitySet

pub mod entry_points;
pub mod handle;
pub mod loader;
pub mod symbols;

pub use entry_points::{
    EntryPoints, ExtensionEntryPoints, GroupResolution, Inst, PluginEntryPoints, SYMBOL_PREFIX,
};
pub use handle::{ModuleHandle, ResolvePolicy};
pub use loader::{DylibLoader, ModuleLoader, StaticLoader, StaticUnit};
pub use symbols::{DynamicLibrary, ExportTable, SymbolTable};
