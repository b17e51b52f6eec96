// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the clapshim configuration system.

use std::path::PathBuf;

use clapshim_config::diagnostic::ConfigError;
use clapshim_config::{load_and_validate_str, load_config_from_path, load_config_from_str};

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[search]
installed_root = "/opt/clap"
extra_dirs = ["/srv/clap"]

[logging]
level = "debug"
file = "/tmp/clapshim.log"

[module]
check_api_version = false
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.search.installed_root, PathBuf::from("/opt/clap"));
    assert_eq!(config.search.extra_dirs, vec![PathBuf::from("/srv/clap")]);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.file, Some(PathBuf::from("/tmp/clapshim.log")));
    assert!(!config.module.check_api_version);
}

#[test]
fn empty_toml_uses_defaults() {
    let config = load_config_from_str("").expect("empty TOML is valid");
    assert_eq!(config.logging.level, "info");
    assert!(config.module.check_api_version);
    assert!(config.search.extra_dirs.is_empty());
}

#[test]
fn unknown_section_is_rejected() {
    let err = load_config_from_str("[serach]\ninstalled_root = \"/x\"\n")
        .expect_err("should reject unknown section");
    assert!(format!("{err}").contains("serach"));
}

#[test]
fn typo_in_module_section_suggests_fix() {
    let errors = load_and_validate_str("[module]\ncheck_api_versoin = true\n").unwrap_err();
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "check_api_versoin");
            assert_eq!(suggestion.as_deref(), Some("check_api_version"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn wrong_type_is_reported() {
    let errors = load_and_validate_str("[search]\nextra_dirs = \"/srv/clap\"\n").unwrap_err();
    assert!(matches!(
        &errors[0],
        ConfigError::InvalidType { key, .. } if key.contains("extra_dirs")
    ));
}

#[test]
fn validation_runs_after_parse() {
    let errors =
        load_and_validate_str("[search]\ninstalled_root = \"relative/dir\"\n").unwrap_err();
    assert!(matches!(&errors[0], ConfigError::Validation { message } if message.contains("absolute")));
}

#[test]
fn load_from_file_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clapshim.toml");
    std::fs::write(&path, "[logging]\nlevel = \"warn\"\n").unwrap();
    let config = load_config_from_path(&path).expect("file should load");
    assert_eq!(config.logging.level, "warn");
}
