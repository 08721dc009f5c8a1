//! Store capability - the external table the facade delegates to
//!
//! The facade only ever talks to a [`ListingStore`]. Which backend sits behind
//! it is decided once at process start:
//!
//! - [`PostgrestStore`]: hosted PostgREST/Supabase REST endpoint (reqwest)
//! - [`PgStore`]: direct Postgres connection pool (sqlx)
//! - [`MemoryStore`]: process-local table for tests and demos

pub mod memory;
pub mod migrations;
pub mod postgres;
pub mod postgrest;
pub mod query;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};

pub use memory::MemoryStore;
pub use postgres::{create_pool, PgStore};
pub use postgrest::PostgrestStore;
pub use query::{contains_pattern, Direction, Filter, Order, Query};

/// A row as exchanged with the store: column name to JSON value
pub type Row = Map<String, Value>;

/// Store error type
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("malformed row: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

/// Table access used by the listing facade.
///
/// Every method is one round trip and returns the rows it touched, as the
/// store reports them.
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Run a select.
    async fn select(&self, query: &Query) -> Result<Vec<Row>, StoreError>;

    /// Insert one row, returning the stored row(s) with server-assigned
    /// columns filled in.
    async fn insert(&self, table: &str, row: Row) -> Result<Vec<Row>, StoreError>;

    /// Overwrite the columns present in `patch` on every row matching all
    /// `filters`.
    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Row,
    ) -> Result<Vec<Row>, StoreError>;

    /// Delete every row matching all `filters`.
    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Row>, StoreError>;
}

/// Serialize a payload into a row. Fields skipped by serde are not sent.
pub fn to_row<T: Serialize>(value: &T) -> Result<Row, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(row) => Ok(row),
        other => Err(StoreError::InvalidQuery(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

/// Plain lowercase SQL identifier, as used for table and column names
static IDENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_]{0,62}$").expect("invalid identifier regex"));

/// Reject table or column names that are not plain identifiers.
pub(crate) fn check_identifier(name: &str) -> Result<&str, StoreError> {
    if IDENT_RE.is_match(name) {
        Ok(name)
    } else {
        Err(StoreError::InvalidQuery(format!(
            "'{}' is not a valid identifier",
            name
        )))
    }
}
