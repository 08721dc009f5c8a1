//! In-memory store
//!
//! Behaves like a hosted table closely enough for tests and local demos:
//! integer ids from a per-table sequence, a strictly increasing `created_at`,
//! and configurable column defaults.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::Value;
use tokio::sync::RwLock;

use super::{Direction, Filter, ListingStore, Query, Row, StoreError};

static NULL: Value = Value::Null;

#[derive(Default)]
struct Table {
    rows: Vec<Row>,
    next_id: i64,
    last_created: Option<DateTime<Utc>>,
}

impl Table {
    fn next_created_at(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_created {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_created = Some(stamp);
        stamp
    }
}

/// Process-local table store
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Table>>,
    defaults: Row,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Columns filled in on insert when the row leaves them out.
    pub fn with_defaults(defaults: Row) -> Self {
        Self {
            tables: RwLock::default(),
            defaults,
        }
    }
}

#[async_trait]
impl ListingStore for MemoryStore {
    async fn select(&self, query: &Query) -> Result<Vec<Row>, StoreError> {
        let tables = self.tables.read().await;
        let Some(table) = tables.get(query.table_name()) else {
            return Ok(Vec::new());
        };

        let mut rows: Vec<Row> = table
            .rows
            .iter()
            .filter(|row| matches_all(row, query.filters()))
            .cloned()
            .collect();

        if let Some(order) = query.ordering() {
            rows.sort_by(|a, b| {
                let ord = compare(
                    a.get(&order.column).unwrap_or(&NULL),
                    b.get(&order.column).unwrap_or(&NULL),
                )
                .unwrap_or(Ordering::Equal);
                match order.direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
        }

        if let Some(limit) = query.row_limit() {
            rows.truncate(limit);
        }

        if !query.columns().is_empty() {
            rows = rows
                .into_iter()
                .map(|row| {
                    row.into_iter()
                        .filter(|(k, _)| query.columns().contains(k))
                        .collect()
                })
                .collect();
        }

        Ok(rows)
    }

    async fn insert(&self, table: &str, mut row: Row) -> Result<Vec<Row>, StoreError> {
        let mut tables = self.tables.write().await;
        let table = tables.entry(table.to_owned()).or_default();

        table.next_id += 1;
        row.entry("id").or_insert_with(|| Value::from(table.next_id));
        let created_at = table
            .next_created_at()
            .to_rfc3339_opts(SecondsFormat::Micros, true);
        row.entry("created_at")
            .or_insert_with(|| Value::String(created_at));
        for (column, value) in &self.defaults {
            row.entry(column.clone()).or_insert_with(|| value.clone());
        }

        table.rows.push(row.clone());
        Ok(vec![row])
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Row,
    ) -> Result<Vec<Row>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(table) = tables.get_mut(table) else {
            return Ok(Vec::new());
        };

        let mut updated = Vec::new();
        for row in table.rows.iter_mut().filter(|r| matches_all(r, filters)) {
            for (column, value) in &patch {
                row.insert(column.clone(), value.clone());
            }
            updated.push(row.clone());
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<Vec<Row>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(table) = tables.get_mut(table) else {
            return Ok(Vec::new());
        };

        let (removed, kept): (Vec<Row>, Vec<Row>) = std::mem::take(&mut table.rows)
            .into_iter()
            .partition(|row| matches_all(row, filters));
        table.rows = kept;
        Ok(removed)
    }
}

fn matches_all(row: &Row, filters: &[Filter]) -> bool {
    filters.iter().all(|f| matches(row, f))
}

fn matches(row: &Row, filter: &Filter) -> bool {
    let cell = |column: &str| row.get(column).unwrap_or(&NULL);
    match filter {
        Filter::Eq { column, value } => compare(cell(column), value) == Some(Ordering::Equal),
        Filter::Gte { column, value } => matches!(
            compare(cell(column), value),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Filter::Lte { column, value } => matches!(
            compare(cell(column), value),
            Some(Ordering::Less | Ordering::Equal)
        ),
        Filter::Ilike { column, needle } => contains_ci(cell(column), needle),
        Filter::AnyIlike { columns, needle } => {
            columns.iter().any(|c| contains_ci(cell(c), needle))
        }
    }
}

/// SQL-ish comparison: NULL and mismatched types compare as unknown.
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn contains_ci(cell: &Value, needle: &str) -> bool {
    match cell {
        Value::String(s) => s.to_lowercase().contains(&needle.to_lowercase()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_id_created_at_and_defaults() {
        let store = MemoryStore::with_defaults(row(json!({"featured": false})));

        let first = store.insert("t", row(json!({"title": "a"}))).await.unwrap();
        let second = store.insert("t", row(json!({"title": "b", "featured": true}))).await.unwrap();

        assert_eq!(first[0]["id"], 1);
        assert_eq!(second[0]["id"], 2);
        assert_eq!(first[0]["featured"], false);
        assert_eq!(second[0]["featured"], true);
        assert!(first[0]["created_at"].as_str().unwrap() < second[0]["created_at"].as_str().unwrap());
    }

    #[tokio::test]
    async fn select_filters_orders_and_limits() {
        let store = MemoryStore::new();
        for price in [100, 300, 200] {
            store.insert("t", row(json!({"price": price}))).await.unwrap();
        }

        let query = Query::table("t")
            .gte("price", 150.0)
            .order("price", Direction::Descending)
            .limit(1);
        let rows = store.select(&query).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["price"], 300);
    }

    #[tokio::test]
    async fn select_projects_columns() {
        let store = MemoryStore::new();
        store.insert("t", row(json!({"title": "x", "price": 1}))).await.unwrap();

        let rows = store
            .select(&Query::table("t").select(["title"]))
            .await
            .unwrap();
        assert_eq!(rows[0].len(), 1);
        assert_eq!(rows[0]["title"], "x");
    }

    #[tokio::test]
    async fn null_never_equals() {
        let store = MemoryStore::new();
        store.insert("t", row(json!({"bedrooms": null}))).await.unwrap();

        let rows = store.select(&Query::table("t").eq("bedrooms", 0)).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn any_ilike_is_case_insensitive_union() {
        let store = MemoryStore::new();
        store.insert("t", row(json!({"a": "Near METRO", "b": "x"}))).await.unwrap();
        store.insert("t", row(json!({"a": "x", "b": "metro line"}))).await.unwrap();
        store.insert("t", row(json!({"a": "metro", "b": "metro"}))).await.unwrap();
        store.insert("t", row(json!({"a": "x", "b": "y"}))).await.unwrap();

        let rows = store
            .select(&Query::table("t").any_ilike(["a", "b"], "metro"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[tokio::test]
    async fn update_and_delete_report_touched_rows() {
        let store = MemoryStore::new();
        store.insert("t", row(json!({"price": 1}))).await.unwrap();
        store.insert("t", row(json!({"price": 2}))).await.unwrap();

        let updated = store
            .update("t", &[Filter::eq("id", 2)], row(json!({"price": 5})))
            .await
            .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0]["price"], 5);

        let missing = store
            .update("t", &[Filter::eq("id", 99)], row(json!({"price": 5})))
            .await
            .unwrap();
        assert!(missing.is_empty());

        let removed = store.delete("t", &[Filter::eq("id", 1)]).await.unwrap();
        assert_eq!(removed.len(), 1);
        let left = store.select(&Query::table("t")).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0]["id"], 2);
    }
}
