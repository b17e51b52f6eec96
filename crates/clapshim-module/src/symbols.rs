// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Name-keyed symbol sources.
//!
//! A [`SymbolTable`] answers "what address does this exported name have".
//! [`DynamicLibrary`] asks the platform loader; [`ExportTable`] is an
//! in-process map for statically linked units and tests.

use std::collections::HashMap;
use std::ffi::c_void;
use std::fmt;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

use clapshim_core::ShimError;
use libloading::Library;

/// A source of exported entry-point addresses.
pub trait SymbolTable: Send + Sync {
    /// Address of the exported symbol `name`, if present.
    fn lookup(&self, name: &str) -> Option<NonNull<c_void>>;

    /// Human-readable origin, used in logs and errors.
    fn origin(&self) -> String;
}

/// A shared library opened with the platform loader.
///
/// The library stays mapped until this value is dropped, so every address
/// obtained from it must not outlive it.
pub struct DynamicLibrary {
    path: PathBuf,
    library: Library,
}

impl DynamicLibrary {
    /// Open a shared library.
    ///
    /// # Safety
    ///
    /// Loading runs the library's initializers. The caller must trust the
    /// library and ensure its exports follow the entry-point conventions.
    pub unsafe fn open(path: &Path) -> Result<Self, ShimError> {
        // SAFETY: forwarded to the caller.
        let library = unsafe { Library::new(path) }.map_err(|e| ShimError::Library {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            library,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SymbolTable for DynamicLibrary {
    fn lookup(&self, name: &str) -> Option<NonNull<c_void>> {
        // SAFETY: the symbol is read as an untyped address and only
        // reinterpreted by entry-point groups with the agreed signature.
        let symbol = unsafe { self.library.get::<*mut c_void>(name.as_bytes()) }.ok()?;
        NonNull::new(*symbol)
    }

    fn origin(&self) -> String {
        self.path.display().to_string()
    }
}

impl fmt::Debug for DynamicLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicLibrary")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// An in-process export table: exported name to function address.
#[derive(Default, Clone)]
pub struct ExportTable {
    name: String,
    exports: HashMap<String, NonNull<c_void>>,
}

// SAFETY: entries are addresses of functions with static lifetime.
unsafe impl Send for ExportTable {}
unsafe impl Sync for ExportTable {}

impl ExportTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exports: HashMap::new(),
        }
    }

    /// Add an export. Null addresses are ignored.
    pub fn export(&mut self, symbol: impl Into<String>, address: *const c_void) -> &mut Self {
        if let Some(address) = NonNull::new(address.cast_mut()) {
            self.exports.insert(symbol.into(), address);
        }
        self
    }

    /// Builder form of [`ExportTable::export`].
    #[must_use]
    pub fn with(mut self, symbol: impl Into<String>, address: *const c_void) -> Self {
        self.export(symbol, address);
        self
    }

    /// Drop an export, e.g. to simulate a module built without it.
    #[must_use]
    pub fn without(mut self, symbol: &str) -> Self {
        self.exports.remove(symbol);
        self
    }

    pub fn len(&self) -> usize {
        self.exports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exports.is_empty()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.exports.contains_key(symbol)
    }
}

impl SymbolTable for ExportTable {
    fn lookup(&self, name: &str) -> Option<NonNull<c_void>> {
        self.exports.get(name).copied()
    }

    fn origin(&self) -> String {
        self.name.clone()
    }
}

impl fmt::Debug for ExportTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.exports.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ExportTable")
            .field("name", &self.name)
            .field("exports", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern "C" fn exported() -> u32 {
        7
    }

    #[test]
    fn export_table_lookup() {
        let table = ExportTable::new("unit").with("clapshim_x", exported as *const c_void);
        assert!(table.lookup("clapshim_x").is_some());
        assert!(table.lookup("clapshim_y").is_none());
        assert_eq!(table.origin(), "unit");

        let table = table.without("clapshim_x");
        assert!(table.is_empty());
    }

    #[test]
    fn null_exports_are_ignored() {
        let table = ExportTable::new("unit").with("clapshim_x", std::ptr::null());
        assert!(!table.contains("clapshim_x"));
    }

    #[test]
    fn opening_a_missing_library_fails() {
        let err = unsafe { DynamicLibrary::open(Path::new("/nonexistent/libnothing.so")) }
            .unwrap_err();
        assert!(err.is_resolution());
    }
}
