// SPDX-FileCopyrightText: 2026 Clapshim Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! clapshim - inspect manifests and implementation modules.
//!
//! This is the command-line companion of the bridge: it runs the same
//! discovery, synthesis and resolution steps a host triggers, and prints
//! what the bridge would expose.

mod inspect;
mod validate;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use clapshim_config::ClapshimConfig;
use clapshim_core::ShimError;

/// clapshim - capability-negotiated CLAP bridge tools.
#[derive(Parser, Debug)]
#[command(name = "clapshim", version, about, long_about = None)]
struct Cli {
    /// Log at debug level regardless of configuration.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a manifest and print the descriptor a host would see.
    Validate {
        /// Path to the manifest JSON document.
        manifest: PathBuf,
    },
    /// Discover and resolve a plugin bundle, then print its capability map.
    Inspect {
        /// Path to the `.clap` bundle.
        plugin: PathBuf,
    },
    /// Print the effective configuration as TOML.
    Config {
        /// Also apply the `clapshim.toml` next to this bundle.
        #[arg(long)]
        bundle: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let bundle_dir = match &cli.command {
        Commands::Inspect { plugin } => plugin.parent().map(Path::to_path_buf),
        Commands::Config { bundle } => bundle.as_deref().and_then(Path::parent).map(Path::to_path_buf),
        Commands::Validate { .. } => None,
    };
    let loaded = match &bundle_dir {
        Some(dir) => clapshim_config::load_and_validate_for_bundle(dir),
        None => clapshim_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            clapshim_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let level = if cli.verbose { "debug" } else { config.logging.level.as_str() };
    init_tracing(level);

    let result = match cli.command {
        Commands::Validate { manifest } => validate::run_validate(&manifest),
        Commands::Inspect { plugin } => inspect::run_inspect(&plugin, &config),
        Commands::Config { .. } => print_config(&config),
    };
    if let Err(e) = result {
        eprintln!("clapshim: {e}");
        std::process::exit(1);
    }
}

fn print_config(config: &ClapshimConfig) -> Result<(), ShimError> {
    let rendered = toml::to_string_pretty(config).map_err(|e| ShimError::Config(e.to_string()))?;
    print!("{rendered}");
    Ok(())
}

/// Initialize the tracing subscriber with an env filter.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("clapshim={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn inspect_takes_a_bundle_path() {
        let cli = Cli::try_parse_from(["clapshim", "inspect", "/plugins/gain.clap"]).unwrap();
        match cli.command {
            Commands::Inspect { plugin } => assert_eq!(plugin, PathBuf::from("/plugins/gain.clap")),
            other => panic!("unexpected command {other:?}"),
        }
        assert!(!cli.verbose);
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["clapshim", "validate", "gain.json", "-v"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn default_config_renders_as_toml() {
        let rendered = toml::to_string_pretty(&ClapshimConfig::default()).unwrap();
        assert!(rendered.contains("[search]"));
        assert!(rendered.contains("level = \"info\""));
        assert!(rendered.contains("check_api_version = true"));
    }
}
