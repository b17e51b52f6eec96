// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Descriptor synthesis.
//!
//! A [`Descriptor`] owns deep copies of every string it hands to the host,
//! so it stays valid however long the manifest lives. Each string is a
//! `CString` and the feature list is a `Vec` of pointers into those strings
//! plus a trailing null. Dropping the descriptor frees everything once; a
//! synthesis that fails partway drops whatever it had already built.

use std::ffi::{CStr, CString, c_char};
use std::fmt;
use std::ptr;

use clapshim_core::ShimError;
use clapshim_core::abi::{CLAP_VERSION, RawPluginDescriptor};

use crate::manifest::Manifest;

/// Feature tags used when a manifest declares none.
pub const DEFAULT_FEATURES: &[&str] = &["audio-effect", "stereo", "mono"];

/// Host-facing plugin descriptor with owned storage.
pub struct Descriptor {
    raw: RawPluginDescriptor,
    id: CString,
    name: CString,
    vendor: CString,
    version: CString,
    description: CString,
    url: Option<CString>,
    manual_url: Option<CString>,
    support_url: Option<CString>,
    features: Vec<CString>,
    // Pointers into `features`, null-terminated.
    feature_ptrs: Vec<*const c_char>,
}

// SAFETY: every pointer in `raw` and `feature_ptrs` targets heap storage
// owned by this struct and never mutated after construction.
unsafe impl Send for Descriptor {}
unsafe impl Sync for Descriptor {}

impl Descriptor {
    /// Build a descriptor from a manifest.
    ///
    /// Fails if any string contains an interior NUL; nothing partially built
    /// survives the error.
    pub fn synthesize(manifest: &Manifest) -> Result<Descriptor, ShimError> {
        let plugin = &manifest.plugin;
        let owned = |field: &str, value: &str| {
            CString::new(value).map_err(|_| ShimError::Descriptor {
                plugin: plugin.id.clone(),
                reason: format!("{field} contains a NUL byte"),
            })
        };
        let optional = |field: &str, value: &Option<String>| -> Result<Option<CString>, ShimError> {
            match value.as_deref().map(str::trim) {
                Some(v) if !v.is_empty() => owned(field, v).map(Some),
                _ => Ok(None),
            }
        };

        let id = owned("id", &plugin.id)?;
        let name = owned("name", &plugin.name)?;
        let vendor = owned("vendor", &plugin.vendor)?;
        let version = owned("version", &plugin.version)?;
        let description = owned("description", &plugin.description)?;
        let url = optional("url", &plugin.url)?;
        let manual_url = optional("manualUrl", &plugin.manual_url)?;
        let support_url = optional("supportUrl", &plugin.support_url)?;

        let tags: Vec<&str> = if plugin.features.is_empty() {
            DEFAULT_FEATURES.to_vec()
        } else {
            plugin.features.iter().map(String::as_str).collect()
        };
        let features = tags
            .into_iter()
            .map(|tag| owned("features", tag))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::assemble(
            id,
            name,
            vendor,
            version,
            description,
            [url, manual_url, support_url],
            features,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        id: CString,
        name: CString,
        vendor: CString,
        version: CString,
        description: CString,
        [url, manual_url, support_url]: [Option<CString>; 3],
        features: Vec<CString>,
    ) -> Descriptor {
        let opt = |s: &Option<CString>| s.as_ref().map_or(ptr::null(), |s| s.as_ptr());
        let mut feature_ptrs: Vec<*const c_char> = features.iter().map(|f| f.as_ptr()).collect();
        feature_ptrs.push(ptr::null());

        let raw = RawPluginDescriptor {
            clap_version: CLAP_VERSION,
            id: id.as_ptr(),
            name: name.as_ptr(),
            vendor: vendor.as_ptr(),
            url: opt(&url),
            manual_url: opt(&manual_url),
            support_url: opt(&support_url),
            version: version.as_ptr(),
            description: description.as_ptr(),
            features: feature_ptrs.as_ptr(),
        };

        Descriptor {
            raw,
            id,
            name,
            vendor,
            version,
            description,
            url,
            manual_url,
            support_url,
            features,
            feature_ptrs,
        }
    }

    /// Pointer handed to the host. Valid while `self` is neither moved nor
    /// dropped.
    pub fn as_raw(&self) -> *const RawPluginDescriptor {
        &self.raw
    }

    pub fn id(&self) -> &CStr {
        &self.id
    }

    pub fn name(&self) -> &CStr {
        &self.name
    }

    pub fn vendor(&self) -> &CStr {
        &self.vendor
    }

    pub fn version(&self) -> &CStr {
        &self.version
    }

    pub fn description(&self) -> &CStr {
        &self.description
    }

    pub fn url(&self) -> Option<&CStr> {
        self.url.as_deref()
    }

    pub fn manual_url(&self) -> Option<&CStr> {
        self.manual_url.as_deref()
    }

    pub fn support_url(&self) -> Option<&CStr> {
        self.support_url.as_deref()
    }

    pub fn features(&self) -> impl Iterator<Item = &CStr> {
        self.features.iter().map(CString::as_c_str)
    }

    /// Number of entries in the null-terminated feature array, excluding
    /// the terminator.
    pub fn feature_count(&self) -> usize {
        self.feature_ptrs.len() - 1
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("vendor", &self.vendor)
            .field("version", &self.version)
            .field("features", &self.features)
            .finish_non_exhaustive()
    }
}
