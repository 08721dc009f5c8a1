//! realty CLI - serve the real-estate listings API
//!
//! - `serve`: run the HTTP API against the configured store
//! - `check`: verify the store is reachable and print what it holds

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;
mod tracing_setup;

use config::RealtyConfig;
use tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "realty",
    author,
    version,
    about = "HTTP API for browsing and managing real-estate listings",
    long_about = "Serve a JSON API over a hosted listings table (PostgREST/Supabase, \
                  Postgres, or an in-memory table for demos)."
)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long, global = true)]
    debug: bool,

    /// Path to config file (default: ~/.realty/config.toml)
    #[arg(long, global = true, value_name = "FILE", env = "REALTY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::ServeArgs),
    /// Check store connectivity and list stored titles and prices
    Check(commands::CheckArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let env_files = config::load_dotenv();
    let cli = Cli::parse();
    tracing_setup::init(&TracingConfig { debug: cli.debug }).ok();

    if env_files.is_empty() {
        tracing::debug!("No .env files found (current dir or ~/.realty)");
    } else {
        for path in &env_files {
            tracing::debug!("Loaded environment from {}", path.display());
        }
    }

    let config = RealtyConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args, config).await?,
        Commands::Check(args) => commands::run_check(args, config).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_flags_parse() {
        let cli = Cli::try_parse_from([
            "realty",
            "--debug",
            "serve",
            "--backend",
            "memory",
            "--bind",
            "127.0.0.1:9001",
            "--table",
            "listings",
        ])
        .unwrap();

        assert!(cli.debug);
        let Commands::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.bind, Some("127.0.0.1:9001".parse().unwrap()));
        assert_eq!(args.store.backend, Some(config::StoreBackend::Memory));
        assert_eq!(args.store.table.as_deref(), Some("listings"));
    }
}
