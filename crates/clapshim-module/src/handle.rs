// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resolved module handles.

use std::fmt;
use std::sync::Arc;

use clapshim_core::{CapabilitySet, MODULE_API_VERSION, ShimError};
use tracing::{info, warn};

use crate::entry_points::EntryPoints;
use crate::symbols::SymbolTable;

/// Resolution policy knobs.
#[derive(Debug, Clone, Copy)]
pub struct ResolvePolicy {
    /// Reject modules whose version probe reports a different API major.
    pub check_api_version: bool,
}

impl Default for ResolvePolicy {
    fn default() -> Self {
        Self {
            check_api_version: true,
        }
    }
}

/// A loaded module with every mandatory entry point resolved.
///
/// Only ever constructed fully resolved. Holds the symbol source alive so
/// the resolved addresses stay valid for the handle's lifetime.
pub struct ModuleHandle {
    name: String,
    entry_points: EntryPoints,
    capabilities: CapabilitySet,
    _symbols: Option<Arc<dyn SymbolTable>>,
}

impl ModuleHandle {
    /// Resolve a module from a symbol source.
    pub fn resolve(
        symbols: Arc<dyn SymbolTable>,
        policy: ResolvePolicy,
    ) -> Result<ModuleHandle, ShimError> {
        let name = symbols.origin();
        let entry_points = EntryPoints::resolve(symbols.as_ref()).map_err(|missing| {
            ShimError::MissingEntryPoints {
                library: name.clone(),
                missing,
            }
        })?;
        let handle = Self::build(name, entry_points, Some(symbols));
        handle.check_version(policy)?;
        Ok(handle)
    }

    /// Wrap entry points of a statically linked unit.
    pub fn from_entry_points(
        name: impl Into<String>,
        entry_points: EntryPoints,
        policy: ResolvePolicy,
    ) -> Result<ModuleHandle, ShimError> {
        let handle = Self::build(name.into(), entry_points, None);
        handle.check_version(policy)?;
        Ok(handle)
    }

    fn build(
        name: String,
        entry_points: EntryPoints,
        symbols: Option<Arc<dyn SymbolTable>>,
    ) -> ModuleHandle {
        let capabilities = entry_points.capabilities();
        info!(module = %name, %capabilities, "module resolved");
        ModuleHandle {
            name,
            entry_points,
            capabilities,
            _symbols: symbols,
        }
    }

    fn check_version(&self, policy: ResolvePolicy) -> Result<(), ShimError> {
        let Some(version) = self.entry_points.version else {
            return Ok(());
        };
        let (mut major, mut minor, mut patch) = (0u32, 0u32, 0u32);
        // SAFETY: the probe writes three integers through valid pointers.
        let reported = unsafe { (version.version)(&mut major, &mut minor, &mut patch) };
        let found = semver::Version::new(major.into(), minor.into(), patch.into());

        if !reported {
            warn!(module = %self.name, "module version probe failed");
        }
        if !policy.check_api_version {
            return Ok(());
        }
        if !reported || found.major != MODULE_API_VERSION.major {
            return Err(ShimError::IncompatibleModule {
                library: self.name.clone(),
                found,
                required: MODULE_API_VERSION,
            });
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry_points(&self) -> &EntryPoints {
        &self.entry_points
    }

    /// Capabilities fixed at resolution time.
    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }
}

impl fmt::Debug for ModuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleHandle")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}
