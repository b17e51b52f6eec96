// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Entry-point resolution against mock export tables.

use std::path::Path;
use std::sync::Arc;

use clapshim_core::{Extension, ShimError};
use clapshim_manifest::Manifest;
use clapshim_module::entry_points::{ParamsEntryPoints, PluginEntryPoints, StateEntryPoints};
use clapshim_module::{
    EntryPoints, ExtensionEntryPoints, GroupResolution, ModuleHandle, ModuleLoader,
    ResolvePolicy, StaticLoader,
};
use clapshim_test_utils::{MockModule, manifest_json};
use proptest::prelude::*;
use tracing_test::traced_test;

fn resolve(module: MockModule) -> Result<ModuleHandle, ShimError> {
    ModuleHandle::resolve(Arc::new(module.into_exports()), ResolvePolicy::default())
}

#[test]
fn mandatory_only_module_has_no_capabilities() {
    let handle = resolve(MockModule::new("libgain.so")).expect("resolves");
    assert!(handle.capabilities().is_empty());
    assert_eq!(handle.name(), "libgain.so");
    assert!(handle.entry_points().main_thread.is_none());
    assert!(handle.entry_points().version.is_none());
}

#[test]
fn params_group_sets_the_params_capability() {
    let handle = resolve(MockModule::new("libgain.so").with_params()).expect("resolves");
    assert!(handle.capabilities().contains(Extension::Params));
    assert!(!handle.capabilities().contains(Extension::State));
    assert_eq!(handle.capabilities().len(), 1);
}

#[test]
fn every_missing_mandatory_symbol_is_reported() {
    for symbol in PluginEntryPoints::SYMBOLS {
        let err = resolve(MockModule::new("libgain.so").without(symbol)).unwrap_err();
        match err {
            ShimError::MissingEntryPoints { library, missing } => {
                assert_eq!(library, "libgain.so");
                assert_eq!(missing, vec![*symbol]);
            }
            other => panic!("expected MissingEntryPoints, got {other}"),
        }
    }
}

#[test]
fn empty_module_lists_all_mandatory_symbols() {
    let exports = PluginEntryPoints::SYMBOLS
        .iter()
        .fold(MockModule::new("libempty.so").into_exports(), |table, symbol| {
            table.without(symbol)
        });
    let err = ModuleHandle::resolve(Arc::new(exports), ResolvePolicy::default()).unwrap_err();
    assert!(err.is_resolution());
    assert!(matches!(err, ShimError::MissingEntryPoints { ref missing, .. } if missing.len() == 9));
}

#[test]
fn group_resolution_classifies_partial_groups() {
    let full = MockModule::new("m").with_state().into_exports();
    assert!(matches!(StateEntryPoints::resolve(&full), GroupResolution::Resolved(_)));

    let partial = MockModule::new("m").with_partial_state().into_exports();
    match StateEntryPoints::resolve(&partial) {
        GroupResolution::Partial(missing) => assert_eq!(missing, vec!["clapshim_state_load"]),
        _ => panic!("expected a partial group"),
    }

    let none = MockModule::new("m").into_exports();
    assert!(matches!(ParamsEntryPoints::resolve(&none), GroupResolution::Absent));
}

#[traced_test]
#[test]
fn partial_group_is_logged_and_treated_as_absent() {
    let handle = resolve(MockModule::new("libgain.so").with_params().with_partial_state())
        .expect("partial optional groups do not fail resolution");
    assert!(handle.capabilities().contains(Extension::Params));
    assert!(!handle.capabilities().contains(Extension::State));
    assert!(logs_contain("extension exported only in part"));
    assert!(logs_contain("clapshim_state_load"));
}

#[test]
fn version_probe_gates_resolution() {
    let compatible = resolve(MockModule::new("m").with_compatible_version()).expect("compatible");
    assert!(compatible.entry_points().version.is_some());

    let err = resolve(MockModule::new("m").with_incompatible_version()).unwrap_err();
    match err {
        ShimError::IncompatibleModule { found, required, .. } => {
            assert_eq!(found.major, required.major + 1);
        }
        other => panic!("expected IncompatibleModule, got {other}"),
    }

    let relaxed = ModuleHandle::resolve(
        Arc::new(MockModule::new("m").with_incompatible_version().into_exports()),
        ResolvePolicy {
            check_api_version: false,
        },
    );
    assert!(relaxed.is_ok());
}

#[test]
fn main_thread_callback_is_optional() {
    let handle = resolve(MockModule::new("m").with_main_thread()).expect("resolves");
    assert!(handle.entry_points().main_thread.is_some());
    assert!(handle.capabilities().is_empty());
}

#[test]
fn static_loader_serves_by_library_name() {
    let manifest = Manifest::load(&manifest_json("com.example.gain", "libgain.so")).unwrap();
    let loader = StaticLoader::new(ResolvePolicy::default())
        .with_unit("libgain.so", MockModule::new("gain").with_params().into_unit());
    let handle = loader.load(&manifest, Path::new("/bundle")).expect("served");
    assert!(handle.capabilities().contains(Extension::Params));

    let other = Manifest::load(&manifest_json("com.example.other", "libother.so")).unwrap();
    let err = loader.load(&other, Path::new("/bundle")).unwrap_err();
    assert!(matches!(err, ShimError::ModuleNotFound { .. }));
}

#[test]
fn single_static_unit_always_locates() {
    let loader = StaticLoader::single(MockModule::new("gain").into_unit(), ResolvePolicy::default());
    let manifest = Manifest::load(&manifest_json("com.example.any", "whatever.so")).unwrap();
    assert!(loader.load(&manifest, Path::new("/bundle")).is_ok());
}

#[test]
fn single_static_unit_honors_its_policy() {
    let manifest = Manifest::load(&manifest_json("com.example.any", "whatever.so")).unwrap();
    let unit = || MockModule::new("gain").with_incompatible_version().into_unit();

    let strict = StaticLoader::single(unit(), ResolvePolicy::default());
    assert!(matches!(
        strict.load(&manifest, Path::new("/bundle")),
        Err(ShimError::IncompatibleModule { .. })
    ));

    let relaxed = StaticLoader::single(
        unit(),
        ResolvePolicy {
            check_api_version: false,
        },
    );
    assert!(relaxed.load(&manifest, Path::new("/bundle")).is_ok());
}

#[test]
fn typed_units_skip_name_lookup() {
    let exports = MockModule::new("gain").with_params().into_exports();
    let entry_points = EntryPoints::resolve(&exports).expect("mandatory set present");
    let handle =
        ModuleHandle::from_entry_points("gain", entry_points, ResolvePolicy::default()).unwrap();
    assert!(handle.capabilities().contains(Extension::Params));
}

#[test]
fn dylib_loader_reports_missing_library() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = Manifest::load(&manifest_json("com.example.gain", "libgain.so")).unwrap();
    let loader = clapshim_module::DylibLoader::new(vec![], ResolvePolicy::default());
    let err = loader.load(&manifest, dir.path()).unwrap_err();
    match err {
        ShimError::ModuleNotFound { library, searched } => {
            assert_eq!(library, "libgain.so");
            assert_eq!(searched, vec![dir.path().join("libgain.so")]);
        }
        other => panic!("expected ModuleNotFound, got {other}"),
    }
}

#[test]
fn dylib_loader_rejects_a_file_that_is_not_a_library() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("libgain.so"), b"not an elf").unwrap();
    let manifest = Manifest::load(&manifest_json("com.example.gain", "libgain.so")).unwrap();
    let loader = clapshim_module::DylibLoader::new(vec![], ResolvePolicy::default());
    let err = loader.load(&manifest, dir.path()).unwrap_err();
    assert!(matches!(err, ShimError::Library { .. }));
}

/// All symbols of every optional group, for property tests.
fn full_module() -> MockModule {
    MockModule::new("m").with_params().with_state().with_latency()
}

proptest! {
    // A capability is present iff every symbol of its group resolved:
    // dropping any subset of a group's symbols removes exactly that flag.
    #[test]
    fn dropping_symbols_clears_only_their_group(mask in 1u8..=63) {
        let params = ExtensionEntryPoints::symbols_of(Extension::Params);
        let dropped: Vec<&str> = params
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, s)| *s)
            .collect();
        let exports = dropped
            .iter()
            .fold(full_module().into_exports(), |table, symbol| table.without(symbol));

        let caps = EntryPoints::resolve(&exports).expect("mandatory set present").capabilities();
        prop_assert!(!caps.contains(Extension::Params));
        prop_assert!(caps.contains(Extension::State));
        prop_assert!(caps.contains(Extension::Latency));
    }
}
