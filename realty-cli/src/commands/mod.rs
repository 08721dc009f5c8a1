//! Command implementations

pub mod check;
pub mod serve;

pub use check::{run_check, CheckArgs};
pub use serve::{run_serve, ServeArgs};

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use realty_server::models::NewListing;
use realty_server::store::{create_pool, migrations, MemoryStore, PgStore, PostgrestStore};
use realty_server::{ListingStore, LISTINGS_TABLE};

use crate::config::{StoreBackend, StoreSection};

/// Store connection flags shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct StoreArgs {
    /// Store backend (default: postgrest)
    #[arg(long, value_enum, env = "REALTY_BACKEND")]
    pub backend: Option<StoreBackend>,

    /// Base URL of the hosted PostgREST/Supabase project
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Option<String>,

    /// API key for the hosted project
    #[arg(long, env = "SUPABASE_KEY", hide_env_values = true)]
    pub supabase_key: Option<String>,

    /// Postgres connection URL (postgres backend)
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Maximum pooled Postgres connections
    #[arg(long)]
    pub max_connections: Option<u32>,

    /// Listings table name (default: properties)
    #[arg(long, env = "REALTY_TABLE")]
    pub table: Option<String>,
}

/// A connected store plus the table it serves
pub struct Connection {
    pub store: Arc<dyn ListingStore>,
    pub table: String,
    pub backend: StoreBackend,
}

impl StoreArgs {
    /// Fill unset flags from the config file's `[store]` section.
    pub fn merge(mut self, file: &StoreSection) -> Self {
        self.backend = self.backend.or(file.backend);
        self.supabase_url = self.supabase_url.or_else(|| file.supabase_url.clone());
        self.supabase_key = self.supabase_key.or_else(|| file.supabase_key.clone());
        self.database_url = self.database_url.or_else(|| file.database_url.clone());
        self.max_connections = self.max_connections.or(file.max_connections);
        self.table = self.table.or_else(|| file.table.clone());
        self
    }

    /// Build the store client. Postgres tables are created first when
    /// `migrate` is set.
    pub async fn connect(self, migrate: bool) -> Result<Connection> {
        let backend = self.backend.unwrap_or_default();
        let table = self.table.unwrap_or_else(|| LISTINGS_TABLE.to_owned());

        let store: Arc<dyn ListingStore> = match backend {
            StoreBackend::Postgrest => {
                let url = self.supabase_url.context(
                    "SUPABASE_URL not set. Set via --supabase-url, SUPABASE_URL env, or ~/.realty/.env",
                )?;
                let key = self.supabase_key.context(
                    "SUPABASE_KEY not set. Set via --supabase-key, SUPABASE_KEY env, or ~/.realty/.env",
                )?;
                info!(url = %url, "Using PostgREST store");
                Arc::new(PostgrestStore::new(&url, key))
            }
            StoreBackend::Postgres => {
                let database_url = self.database_url.context(
                    "DATABASE_URL not set. Set via --database-url, DATABASE_URL env, or ~/.realty/.env",
                )?;
                let pool = create_pool(&database_url, self.max_connections)
                    .await
                    .context("Failed to create database pool")?;
                if migrate {
                    migrations::run(&pool, &table)
                        .await
                        .context("Failed to run migrations")?;
                }
                info!("Using Postgres store");
                Arc::new(PgStore::new(pool))
            }
            StoreBackend::Memory => {
                info!("Using in-memory store, data is lost on exit");
                Arc::new(MemoryStore::with_defaults(NewListing::column_defaults()))
            }
        };

        Ok(Connection {
            store,
            table,
            backend,
        })
    }
}
