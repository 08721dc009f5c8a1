//! HTTP server command
//!
//! Runs the listings API against the configured store.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;

use realty_server::models::NewListing;
use realty_server::{run_server, AppState, ListingRepo, ListingStore, ServerConfig};

use super::StoreArgs;
use crate::config::{RealtyConfig, StoreBackend};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (default: 0.0.0.0:8001)
    #[arg(long, short = 'b', env = "REALTY_BIND")]
    pub bind: Option<SocketAddr>,

    #[command(flatten)]
    pub store: StoreArgs,

    /// Create the listings table before serving (postgres backend)
    #[arg(long)]
    pub migrate: bool,

    /// JSON array of listings to insert at startup (memory backend)
    #[arg(long, value_name = "FILE")]
    pub seed: Option<PathBuf>,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs, config: RealtyConfig) -> Result<()> {
    let bind_addr = args
        .bind
        .or(config.server.bind)
        .unwrap_or_else(|| ServerConfig::default().bind_addr);

    let conn = args.store.merge(&config.store).connect(args.migrate).await?;

    if let Some(path) = &args.seed {
        if conn.backend != StoreBackend::Memory {
            bail!("--seed is only supported with the memory backend");
        }
        let count = seed(conn.store.as_ref(), &conn.table, path).await?;
        tracing::info!(count, "Seeded listings from {}", path.display());
    }

    tracing::info!("Starting realty server on {}", bind_addr);

    let state = AppState::new(conn.store).with_table(conn.table);
    run_server(state, ServerConfig { bind_addr })
        .await
        .context("Server error")?;

    Ok(())
}

/// Insert every listing in the JSON array at `path`, in file order.
async fn seed(store: &dyn ListingStore, table: &str, path: &Path) -> Result<usize> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file: {}", path.display()))?;
    let listings: Vec<NewListing> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse seed file: {}", path.display()))?;

    let repo = ListingRepo::new(store, table);
    for listing in &listings {
        repo.create(listing)
            .await
            .with_context(|| format!("Failed to insert '{}'", listing.title))?;
    }
    Ok(listings.len())
}
