// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for clapshim.
//!
//! TOML files layered with Figment (system, user, plugin bundle), `CLAPSHIM_*`
//! environment overrides, strict `deny_unknown_fields` parsing, and miette
//! diagnostics with typo suggestions.
//!
//! ```no_run
//! use clapshim_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("installed root: {}", config.search.installed_root.display());
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors, to_shim_error};
pub use loader::{load_config, load_config_for_bundle, load_config_from_path, load_config_from_str};
pub use model::ClapshimConfig;

/// Load configuration from the system and user files and validate it.
pub fn load_and_validate() -> Result<ClapshimConfig, Vec<ConfigError>> {
    finish(loader::load_config(), || collect_toml_sources(None))
}

/// Load configuration for a plugin bundle directory and validate it.
pub fn load_and_validate_for_bundle(bundle_dir: &Path) -> Result<ClapshimConfig, Vec<ConfigError>> {
    finish(loader::load_config_for_bundle(bundle_dir), || {
        collect_toml_sources(Some(bundle_dir))
    })
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<ClapshimConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

fn finish(
    loaded: Result<ClapshimConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<ClapshimConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

/// Read the TOML files that took part in loading, for error spans.
fn collect_toml_sources(bundle_dir: Option<&Path>) -> Vec<(String, String)> {
    let mut paths = vec![Path::new(loader::SYSTEM_CONFIG_PATH).to_path_buf()];
    paths.extend(loader::user_config_path());
    paths.extend(bundle_dir.map(|dir| dir.join(loader::CONFIG_FILE_NAME)));

    paths
        .into_iter()
        .filter_map(|path| {
            let content = std::fs::read_to_string(&path).ok()?;
            Some((path.display().to_string(), content))
        })
        .collect()
}
