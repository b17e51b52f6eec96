// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation: checks serde attributes cannot express.

use crate::diagnostic::ConfigError;
use crate::model::ClapshimConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Validate a deserialized configuration.
///
/// Collects every problem instead of failing on the first one.
pub fn validate_config(config: &ClapshimConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.logging.level.trim();
    if level.is_empty() {
        errors.push(ConfigError::Validation {
            message: "logging.level must not be empty".to_string(),
        });
    } else if !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "logging.level `{level}` is not one of {}",
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if !config.search.installed_root.is_absolute() {
        errors.push(ConfigError::Validation {
            message: format!(
                "search.installed_root must be an absolute path, got `{}`",
                config.search.installed_root.display()
            ),
        });
    }

    for dir in &config.search.extra_dirs {
        if !dir.is_absolute() {
            errors.push(ConfigError::Validation {
                message: format!(
                    "search.extra_dirs entries must be absolute paths, got `{}`",
                    dir.display()
                ),
            });
        }
    }

    if let Some(file) = &config.logging.file
        && file.as_os_str().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "logging.file must not be empty when set".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
