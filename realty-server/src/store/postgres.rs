//! Direct Postgres backend
//!
//! Uses a sqlx `PgPool` with explicit connection limits. Every value is a
//! bound parameter; table and column names are checked against a plain
//! identifier pattern and quoted. Rows come back as `jsonb`, so the facade
//! sees the same shape as from the REST backend.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{
    check_identifier, contains_pattern, Direction, Filter, ListingStore, Query, Row, StoreError,
};

/// Default maximum connections for the pool.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Create a PostgreSQL connection pool.
///
/// `max_connections` falls back to a small default when `None`.
pub async fn create_pool(
    database_url: &str,
    max_connections: Option<u32>,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS))
        .connect(database_url)
        .await
}

/// Postgres-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_rows(
        &self,
        mut builder: QueryBuilder<'_, Postgres>,
    ) -> Result<Vec<Row>, StoreError> {
        tracing::debug!(sql = builder.sql(), "postgres query");
        let rows: Vec<(Json<Value>,)> = builder.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|(Json(value),)| match value {
                Value::Object(row) => Ok(row),
                other => Err(StoreError::InvalidQuery(format!(
                    "expected a row object, got {}",
                    other
                ))),
            })
            .collect()
    }
}

#[async_trait]
impl ListingStore for PgStore {
    async fn select(&self, query: &Query) -> Result<Vec<Row>, StoreError> {
        let builder = build_select(query)?;
        self.fetch_rows(builder).await
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Vec<Row>, StoreError> {
        let builder = build_insert(table, row)?;
        self.fetch_rows(builder).await
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Row,
    ) -> Result<Vec<Row>, StoreError> {
        let builder = build_update(table, filters, patch)?;
        self.fetch_rows(builder).await
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Row>, StoreError> {
        let builder = build_delete(table, filters)?;
        self.fetch_rows(builder).await
    }
}

fn quoted(name: &str) -> Result<String, StoreError> {
    Ok(format!("\"{}\"", check_identifier(name)?))
}

pub(crate) fn build_select(query: &Query) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
    let mut builder = QueryBuilder::new("SELECT ");
    if query.columns().is_empty() {
        builder.push("to_jsonb(t)");
    } else {
        let pairs = query
            .columns()
            .iter()
            .map(|c| -> Result<String, StoreError> {
                Ok(format!("'{}', t.{}", check_identifier(c)?, quoted(c)?))
            })
            .collect::<Result<Vec<_>, _>>()?;
        builder.push(format!("jsonb_build_object({})", pairs.join(", ")));
    }
    builder.push(format!(" FROM {} AS t", quoted(query.table_name())?));
    push_where(&mut builder, query.filters())?;

    if let Some(order) = query.ordering() {
        let direction = match order.direction {
            Direction::Ascending => "ASC",
            Direction::Descending => "DESC",
        };
        builder.push(format!(" ORDER BY t.{} {}", quoted(&order.column)?, direction));
    }
    if let Some(limit) = query.row_limit() {
        builder.push(" LIMIT ");
        builder.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    }
    Ok(builder)
}

pub(crate) fn build_insert(table: &str, row: Row) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
    if row.is_empty() {
        return Err(StoreError::InvalidQuery("nothing to insert".into()));
    }
    let table = quoted(table)?;
    let columns = row
        .keys()
        .map(|c| quoted(c))
        .collect::<Result<Vec<_>, _>>()?
        .join(", ");

    let mut builder = QueryBuilder::new(format!(
        "INSERT INTO {table} AS t ({columns}) SELECT {columns} FROM jsonb_populate_record(NULL::{table}, "
    ));
    builder.push_bind(Json(Value::Object(row)));
    builder.push(") RETURNING to_jsonb(t)");
    Ok(builder)
}

pub(crate) fn build_update(
    table: &str,
    filters: &[Filter],
    patch: Row,
) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
    if patch.is_empty() {
        return Err(StoreError::InvalidQuery("nothing to update".into()));
    }
    let table = quoted(table)?;
    let assignments = patch
        .keys()
        .map(|c| -> Result<String, StoreError> {
            let c = quoted(c)?;
            Ok(format!("{c} = src.{c}"))
        })
        .collect::<Result<Vec<_>, _>>()?
        .join(", ");

    let mut builder = QueryBuilder::new(format!(
        "UPDATE {table} AS t SET {assignments} FROM jsonb_populate_record(NULL::{table}, "
    ));
    builder.push_bind(Json(Value::Object(patch)));
    builder.push(") AS src");
    push_where(&mut builder, filters)?;
    builder.push(" RETURNING to_jsonb(t)");
    Ok(builder)
}

pub(crate) fn build_delete(
    table: &str,
    filters: &[Filter],
) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
    let mut builder = QueryBuilder::new(format!("DELETE FROM {} AS t", quoted(table)?));
    push_where(&mut builder, filters)?;
    builder.push(" RETURNING to_jsonb(t)");
    Ok(builder)
}

fn push_where(
    builder: &mut QueryBuilder<'static, Postgres>,
    filters: &[Filter],
) -> Result<(), StoreError> {
    for (i, filter) in filters.iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        match filter {
            Filter::Eq { column, value: Value::Null } => {
                builder.push(format!("t.{} IS NULL", quoted(column)?));
            }
            Filter::Eq { column, value } => {
                builder.push(format!("t.{} = ", quoted(column)?));
                push_scalar(builder, value)?;
            }
            Filter::Gte { column, value } => {
                builder.push(format!("t.{} >= ", quoted(column)?));
                push_scalar(builder, value)?;
            }
            Filter::Lte { column, value } => {
                builder.push(format!("t.{} <= ", quoted(column)?));
                push_scalar(builder, value)?;
            }
            Filter::Ilike { column, needle } => {
                builder.push(format!("t.{} ILIKE ", quoted(column)?));
                builder.push_bind(contains_pattern(needle));
            }
            Filter::AnyIlike { columns, needle } => {
                if columns.is_empty() {
                    builder.push("FALSE");
                    continue;
                }
                let pattern = contains_pattern(needle);
                builder.push("(");
                for (j, column) in columns.iter().enumerate() {
                    if j > 0 {
                        builder.push(" OR ");
                    }
                    builder.push(format!("t.{} ILIKE ", quoted(column)?));
                    builder.push_bind(pattern.clone());
                }
                builder.push(")");
            }
        }
    }
    Ok(())
}

fn push_scalar(
    builder: &mut QueryBuilder<'static, Postgres>,
    value: &Value,
) -> Result<(), StoreError> {
    match value {
        Value::Bool(b) => {
            builder.push_bind(*b);
        }
        Value::Number(n) => match n.as_i64() {
            Some(i) => {
                builder.push_bind(i);
            }
            None => {
                builder.push_bind(n.as_f64().unwrap_or(f64::NAN));
            }
        },
        Value::String(s) => {
            builder.push_bind(s.clone());
        }
        other => {
            return Err(StoreError::InvalidQuery(format!(
                "cannot compare against {}",
                other
            )))
        }
    }
    Ok(())
}
