//! Configuration loading
//!
//! Settings come from three places, highest priority first:
//! 1. Command-line flags and environment variables (including `.env` files)
//! 2. `~/.realty/config.toml` (or the file given with `--config`)
//! 3. Built-in defaults

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Deserialize;
use tracing::{debug, info};

/// Which store backend serves the listings table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Hosted PostgREST / Supabase REST endpoint
    #[default]
    Postgrest,
    /// Direct Postgres connection
    Postgres,
    /// Process-local table, lost on exit
    Memory,
}

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RealtyConfig {
    pub server: ServerSection,
    pub store: StoreSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: Option<SocketAddr>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub backend: Option<StoreBackend>,
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub database_url: Option<String>,
    pub max_connections: Option<u32>,
    pub table: Option<String>,
}

impl RealtyConfig {
    /// Load the config file.
    ///
    /// An explicit path must exist. The default path is optional and a
    /// missing file yields the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => {
                    debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Config directory (~/.realty)
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".realty"))
}

fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Load environment variables from .env files
///
/// Priority order (highest to lowest):
/// 1. Variables already set in the environment
/// 2. Current directory .env
/// 3. ~/.realty/.env
///
/// Runs before argument parsing so clap's `env` fallbacks see the values.
/// Returns the files that were loaded.
pub fn load_dotenv() -> Vec<PathBuf> {
    let mut loaded_from = Vec::new();

    if let Ok(path) = dotenvy::dotenv() {
        loaded_from.push(path);
    }

    if let Some(env_file) = config_dir().map(|dir| dir.join(".env")) {
        // dotenvy never overwrites variables that are already set
        if env_file.exists() && dotenvy::from_path(&env_file).is_ok() {
            loaded_from.push(env_file);
        }
    }

    loaded_from
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_full_file() {
        let config = RealtyConfig::parse(
            r#"
            [server]
            bind = "127.0.0.1:9000"

            [store]
            backend = "postgres"
            database_url = "postgres://localhost/realty"
            max_connections = 8
            table = "listings"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.bind, Some("127.0.0.1:9000".parse().unwrap()));
        assert_eq!(config.store.backend, Some(StoreBackend::Postgres));
        assert_eq!(config.store.max_connections, Some(8));
        assert_eq!(config.store.table.as_deref(), Some("listings"));
        assert!(config.store.supabase_url.is_none());
    }

    #[test]
    fn empty_file_is_defaults() {
        let config = RealtyConfig::parse("").unwrap();
        assert!(config.server.bind.is_none());
        assert!(config.store.backend.is_none());
    }

    #[test]
    fn unknown_backend_is_rejected() {
        assert!(RealtyConfig::parse("[store]\nbackend = \"sqlite\"").is_err());
    }

    #[test]
    fn explicit_path_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[store]\nbackend = \"memory\"").unwrap();

        let config = RealtyConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.store.backend, Some(StoreBackend::Memory));
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = RealtyConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
