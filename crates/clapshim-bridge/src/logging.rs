// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tracing subscriber setup for the loaded bridge.

use std::fs::OpenOptions;
use std::sync::Mutex;

use clapshim_config::model::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Filter from `RUST_LOG`, else `logging.level` for clapshim crates.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("clapshim={},warn", level.to_lowercase())))
}

/// Install a global subscriber unless the host already has one.
///
/// Returns whether this call installed it. With `logging.file` set, output
/// is appended to that file; otherwise it goes to stderr.
pub fn init_logging(config: &LoggingConfig) -> bool {
    let filter = env_filter(&config.level);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false);

    let file = config
        .file
        .as_ref()
        .and_then(|path| OpenOptions::new().create(true).append(true).open(path).ok());
    match file {
        Some(file) => builder
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init()
            .is_ok(),
        None => builder.with_writer(std::io::stderr).try_init().is_ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[serial_test::serial]
    fn level_is_lowercased_into_the_filter() {
        // SAFETY: tests touching the environment are serialized.
        unsafe { std::env::remove_var("RUST_LOG") };
        assert!(env_filter("DEBUG").to_string().contains("clapshim=debug"));
    }
}
