//! Store connectivity probe
//!
//! Reads every listing and prints one `title: price` line per row.

use anyhow::{Context, Result};
use clap::Parser;

use realty_server::models::ListingFilters;
use realty_server::store::Row;
use realty_server::ListingRepo;
use serde_json::Value;

use super::StoreArgs;
use crate::config::RealtyConfig;

/// Arguments for the check command
#[derive(Parser, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub store: StoreArgs,
}

/// Connect, list all listings and print a summary
pub async fn run_check(args: CheckArgs, config: RealtyConfig) -> Result<()> {
    let conn = args.store.merge(&config.store).connect(false).await?;
    let repo = ListingRepo::new(conn.store.as_ref(), &conn.table);

    let listings = repo
        .list(&ListingFilters::default())
        .await
        .with_context(|| format!("Failed to read table '{}'", conn.table))?;

    println!("Connected. {} listing(s) in '{}'", listings.len(), conn.table);
    for line in summary_lines(&listings) {
        println!("{line}");
    }
    Ok(())
}

fn summary_lines(listings: &[Row]) -> Vec<String> {
    listings
        .iter()
        .map(|row| format!("{}: {}", cell(row, "title"), cell(row, "price")))
        .collect()
}

/// Strings print bare, anything else (including a missing column) as JSON.
fn cell(row: &Row, column: &str) -> String {
    match row.get(column) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => Value::Null.to_string(),
    }
}
