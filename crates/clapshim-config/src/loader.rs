// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! `/etc/clapshim/clapshim.toml` < `~/.config/clapshim/clapshim.toml` <
//! `<bundle dir>/clapshim.toml` < `CLAPSHIM_*` environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ClapshimConfig;

/// File name looked up in every configuration directory.
pub const CONFIG_FILE_NAME: &str = "clapshim.toml";

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/clapshim/clapshim.toml";

/// User configuration file under the XDG config directory, if one exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("clapshim").join(CONFIG_FILE_NAME))
}

/// Load configuration from the system and user files plus env overrides.
pub fn load_config() -> Result<ClapshimConfig, figment::Error> {
    build_figment(None).extract()
}

/// Load configuration for a plugin bundle, adding `<bundle_dir>/clapshim.toml`
/// between the user file and the environment.
pub fn load_config_for_bundle(bundle_dir: &Path) -> Result<ClapshimConfig, figment::Error> {
    build_figment(Some(bundle_dir)).extract()
}

/// Load configuration from a TOML string only (no file or env lookup).
pub fn load_config_from_str(toml_content: &str) -> Result<ClapshimConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ClapshimConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ClapshimConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ClapshimConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the layered Figment before extraction.
pub fn build_figment(bundle_dir: Option<&Path>) -> Figment {
    let mut figment = Figment::new()
        .merge(Serialized::defaults(ClapshimConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()));
    if let Some(dir) = bundle_dir {
        figment = figment.merge(Toml::file(dir.join(CONFIG_FILE_NAME)));
    }
    figment.merge(env_provider())
}

/// Environment provider mapping `CLAPSHIM_<SECTION>_<KEY>` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because keys such as
/// `installed_root` contain underscores themselves.
fn env_provider() -> Env {
    Env::prefixed("CLAPSHIM_").map(|key| {
        key.as_str()
            .replacen("search_", "search.", 1)
            .replacen("logging_", "logging.", 1)
            .replacen("module_", "module.", 1)
            .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_nested_keys() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("CLAPSHIM_SEARCH_INSTALLED_ROOT", "/opt/clap");
            jail.set_env("CLAPSHIM_LOGGING_LEVEL", "debug");
            jail.set_env("CLAPSHIM_MODULE_CHECK_API_VERSION", "false");
            let config: ClapshimConfig = Figment::new()
                .merge(Serialized::defaults(ClapshimConfig::default()))
                .merge(env_provider())
                .extract()?;
            assert_eq!(config.search.installed_root, PathBuf::from("/opt/clap"));
            assert_eq!(config.logging.level, "debug");
            assert!(!config.module.check_api_version);
            Ok(())
        });
    }

    #[test]
    fn bundle_file_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            let bundle = jail.directory().join("bundle");
            std::fs::create_dir_all(&bundle).map_err(|e| e.to_string())?;
            std::fs::write(
                bundle.join(CONFIG_FILE_NAME),
                "[logging]\nlevel = \"trace\"\n",
            )
            .map_err(|e| e.to_string())?;
            let config = load_config_for_bundle(&bundle)?;
            assert_eq!(config.logging.level, "trace");
            Ok(())
        });
    }

    #[test]
    fn env_beats_bundle_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(CONFIG_FILE_NAME, "[logging]\nlevel = \"trace\"\n")?;
            jail.set_env("CLAPSHIM_LOGGING_LEVEL", "warn");
            let config = load_config_for_bundle(jail.directory())?;
            assert_eq!(config.logging.level, "warn");
            Ok(())
        });
    }
}
