// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Loading a real shared library through the platform loader.
//!
//! The module under `tests/fixtures/gain_module.rs` is compiled once per
//! test run with `rustc --crate-type cdylib` into the target tmp dir.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::ptr;
use std::sync::OnceLock;

use clapshim_core::{CapabilitySet, Extension, MODULE_API_VERSION, ShimError};
use clapshim_manifest::Manifest;
use clapshim_module::{DylibLoader, ModuleHandle, ModuleLoader, ResolvePolicy};
use clapshim_test_utils::manifest_json;

const FIXTURE_SOURCE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/gain_module.rs");

/// Path of the compiled fixture library, built on first use.
fn fixture_library() -> &'static Path {
    static BUILT: OnceLock<PathBuf> = OnceLock::new();
    BUILT.get_or_init(|| {
        let out_dir = Path::new(env!("CARGO_TARGET_TMPDIR")).join("clapshim-module-fixture");
        std::fs::create_dir_all(&out_dir).expect("fixture dir");
        let output = out_dir.join(libloading::library_filename("gain_fixture"));
        let rustc = std::env::var_os("RUSTC").unwrap_or_else(|| "rustc".into());
        let status = Command::new(rustc)
            .args(["--crate-type", "cdylib", "--edition", "2021", "--crate-name", "gain_fixture"])
            .arg("-o")
            .arg(&output)
            .arg(FIXTURE_SOURCE)
            .env("FIXTURE_API_MAJOR", MODULE_API_VERSION.major.to_string())
            .status()
            .expect("rustc runs");
        assert!(status.success(), "fixture module failed to compile");
        output
    })
}

/// Copy the fixture into `dir` under the platform name for `gain`.
fn install_fixture(dir: &Path) -> PathBuf {
    let target = dir.join(libloading::library_filename("gain"));
    std::fs::copy(fixture_library(), &target).expect("copy fixture");
    target
}

fn gain_manifest() -> Manifest {
    Manifest::load(&manifest_json("com.example.gain", "gain")).unwrap()
}

fn assert_fixture_capabilities(handle: &ModuleHandle) {
    let expected = CapabilitySet::empty()
        .with(Extension::Params)
        .with(Extension::Latency);
    assert_eq!(handle.capabilities(), expected);
    assert!(handle.entry_points().version.is_some());
    assert!(handle.entry_points().main_thread.is_none());
}

#[test]
fn loads_and_resolves_a_library_in_the_bundle_dir() {
    let bundle = tempfile::tempdir().unwrap();
    install_fixture(bundle.path());

    let loader = DylibLoader::new(vec![], ResolvePolicy::default());
    let handle = loader.load(&gain_manifest(), bundle.path()).expect("fixture loads");
    assert_fixture_capabilities(&handle);

    // Resolved addresses are live functions in the mapped library.
    let entry_points = handle.entry_points();
    let latency = entry_points.extensions.latency.expect("latency group");
    let params = entry_points.extensions.params.expect("params group");
    unsafe {
        let inst = (entry_points.plugin.create)(ptr::null(), c"com.example.gain".as_ptr());
        assert!(!inst.is_null());
        assert!((entry_points.plugin.init)(inst));
        assert_eq!((latency.get)(inst), 256);
        assert_eq!((params.count)(inst), 1);
        let mut value = 0.0;
        assert!((params.get_value)(inst, 0, &mut value));
        assert_eq!(value, 0.5);
        (entry_points.plugin.destroy)(inst);
    }
}

#[test]
fn falls_back_when_the_bundle_dir_lacks_the_library() {
    let bundle = tempfile::tempdir().unwrap();
    let fallback = tempfile::tempdir().unwrap();
    let installed = install_fixture(fallback.path());

    let loader = DylibLoader::new(vec![fallback.path().to_path_buf()], ResolvePolicy::default());
    assert_eq!(loader.locate("gain", bundle.path()).unwrap(), installed);

    let handle = loader.load(&gain_manifest(), bundle.path()).expect("fixture loads from fallback");
    assert_fixture_capabilities(&handle);
}

#[test]
fn bundle_dir_wins_over_fallback() {
    let bundle = tempfile::tempdir().unwrap();
    let fallback = tempfile::tempdir().unwrap();
    let preferred = install_fixture(bundle.path());
    install_fixture(fallback.path());

    let loader = DylibLoader::new(vec![fallback.path().to_path_buf()], ResolvePolicy::default());
    assert_eq!(loader.locate("gain", bundle.path()).unwrap(), preferred);
}

#[test]
fn fallback_misses_are_all_reported() {
    let bundle = tempfile::tempdir().unwrap();
    let fallback = tempfile::tempdir().unwrap();
    let loader = DylibLoader::new(vec![fallback.path().to_path_buf()], ResolvePolicy::default());
    match loader.load(&gain_manifest(), bundle.path()) {
        Err(ShimError::ModuleNotFound { searched, .. }) => {
            assert_eq!(searched.len(), 4);
            assert!(searched.iter().any(|p| p.starts_with(fallback.path())));
        }
        other => panic!("expected ModuleNotFound, got {other:?}"),
    }
}
