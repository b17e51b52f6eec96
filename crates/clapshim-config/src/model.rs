// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model for the clapshim bridge.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a typo in a config
//! file is reported instead of silently ignored.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level clapshim configuration.
///
/// Every section is optional and falls back to defaults that work for a
/// plugin installed under the user's `~/.clap` directory.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClapshimConfig {
    /// Where manifests and module libraries are looked up.
    #[serde(default)]
    pub search: SearchConfig,

    /// Diagnostic logging.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Module resolution policy.
    #[serde(default)]
    pub module: ModuleConfig,
}

/// Search locations for manifests and module libraries.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
    /// Well-known installed-plugins root, searched after the bundle's own
    /// directory. Manifests live in `<root>/manifests`, libraries in `<root>`.
    #[serde(default = "default_installed_root")]
    pub installed_root: PathBuf,

    /// Additional directories searched after the installed root.
    #[serde(default)]
    pub extra_dirs: Vec<PathBuf>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            installed_root: default_installed_root(),
            extra_dirs: Vec::new(),
        }
    }
}

fn default_installed_root() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".clap"))
        .unwrap_or_else(|| PathBuf::from("/usr/lib/clap"))
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Level filter (trace, debug, info, warn, error). `RUST_LOG` wins.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Append logs to this file instead of stderr.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Module resolution policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleConfig {
    /// Reject modules whose `clapshim_get_version` major differs from ours.
    #[serde(default = "default_check_api_version")]
    pub check_api_version: bool,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            check_api_version: default_check_api_version(),
        }
    }
}

fn default_check_api_version() -> bool {
    true
}

impl ClapshimConfig {
    /// Directory holding centrally installed manifest documents.
    pub fn manifest_dir(&self) -> PathBuf {
        self.search.installed_root.join("manifests")
    }

    /// Fallback directories for manifests and libraries, in search order.
    pub fn fallback_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = vec![self.manifest_dir(), self.search.installed_root.clone()];
        dirs.extend(self.search.extra_dirs.iter().cloned());
        dirs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_dot_clap() {
        let config = ClapshimConfig::default();
        assert!(config.search.installed_root.ends_with(".clap") || dirs::home_dir().is_none());
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.file.is_none());
        assert!(config.module.check_api_version);
    }

    #[test]
    fn fallback_dirs_order() {
        let mut config = ClapshimConfig::default();
        config.search.installed_root = PathBuf::from("/opt/clap");
        config.search.extra_dirs = vec![PathBuf::from("/srv/plugins")];
        assert_eq!(
            config.fallback_dirs(),
            vec![
                PathBuf::from("/opt/clap/manifests"),
                PathBuf::from("/opt/clap"),
                PathBuf::from("/srv/plugins"),
            ]
        );
    }

    #[test]
    fn partial_sections_fill_defaults() {
        let config: ClapshimConfig = toml::from_str("[logging]\nlevel = \"debug\"\n").unwrap();
        assert_eq!(config.logging.level, "debug");
        assert!(config.module.check_api_version);
    }
}
