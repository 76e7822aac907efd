//! PharmaScout command-line shell
//!
//! Thin operator shell over the discovery pipeline. Core logic lives in the
//! other workspace crates; this binary loads configuration, wires the
//! registry, fetcher and store together and prints results.

mod commands;
mod state;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pharmascout_core::AppConfig;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "pharmascout")]
#[command(version, about = "Discover regulator-listed manufacturers of pharmaceutical ingredients")]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, env = "PHARMASCOUT_CONFIG")]
    config: Option<PathBuf>,

    /// Directory of source definition TOML files
    #[arg(long, global = true)]
    definitions: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search every registry source for manufacturers of an ingredient
    Discover {
        /// Ingredient (API) name, e.g. "Paracetamol"
        api_name: String,

        /// Stop collecting after this many seconds
        #[arg(long)]
        deadline_secs: Option<u64>,

        /// Print the run result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the trusted regulator sources
    Sources,

    /// Show stored manufacturers of an ingredient
    List {
        /// Ingredient (API) name
        api_name: String,

        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete stored records attributed to a source
    Purge {
        /// Source name, or a SQL LIKE pattern with --like
        pattern: String,

        /// Treat the pattern as a SQL LIKE pattern
        #[arg(long)]
        like: bool,
    },
}

/// Initialize tracing subscriber for logging
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,pharmascout=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    match path {
        Some(path) => {
            let mut config = AppConfig::load_from(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?;
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
        None => AppConfig::load_with_env().context("failed to load config"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    info!("Starting PharmaScout v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Discover {
            api_name,
            deadline_secs,
            json,
        } => {
            let registry = state::open_registry(&config, cli.definitions.as_deref())?;
            let db = state::open_database(&config).await?;
            commands::discover(&config, registry, db, &api_name, deadline_secs, json).await
        }
        Commands::Sources => {
            let registry = state::open_registry(&config, cli.definitions.as_deref())?;
            commands::sources(&registry);
            Ok(())
        }
        Commands::List { api_name, json } => {
            let db = state::open_database(&config).await?;
            commands::list(db.as_ref(), &api_name, json).await
        }
        Commands::Purge { pattern, like } => {
            let db = state::open_database(&config).await?;
            commands::purge(db.as_ref(), &pattern, like).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_discover() {
        let cli = Cli::try_parse_from([
            "pharmascout",
            "--definitions",
            "defs",
            "discover",
            "Paracetamol",
            "--deadline-secs",
            "90",
            "--json",
        ])
        .expect("parse args");

        assert_eq!(cli.definitions, Some(PathBuf::from("defs")));
        match cli.command {
            Commands::Discover {
                api_name,
                deadline_secs,
                json,
            } => {
                assert_eq!(api_name, "Paracetamol");
                assert_eq!(deadline_secs, Some(90));
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_purge_like() {
        let cli = Cli::try_parse_from(["pharmascout", "purge", "Legacy%", "--like"])
            .expect("parse args");
        assert!(matches!(
            cli.command,
            Commands::Purge { ref pattern, like: true } if pattern == "Legacy%"
        ));
    }

    #[test]
    fn test_discover_requires_api_name() {
        assert!(Cli::try_parse_from(["pharmascout", "discover"]).is_err());
    }

    #[test]
    fn test_load_config_from_explicit_path() {
        let temp_dir = tempfile::TempDir::new().expect("create temp dir");
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[discovery]\nmax_retries = 0\n").expect("write config");

        let config = load_config(Some(&path)).expect("load config");
        assert_eq!(config.discovery.max_retries, 0);

        let missing = temp_dir.path().join("missing.toml");
        assert!(load_config(Some(&missing)).is_err());
    }
}
