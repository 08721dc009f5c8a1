//! Listing repository - the facade operations
//!
//! Each operation is a single round trip to the injected [`ListingStore`]:
//! - list: optional filters ANDed, newest first, no pagination
//! - featured: `featured = true`, at most six rows
//! - get: by id, NotFound when nothing matches
//! - create / update / delete: rows echoed back by the store
//! - search: substring match across title, location, locality, description
//!
//! Update and delete on an unknown id are idempotent no-ops: they succeed
//! with no rows, unlike get which reports NotFound.
//!
//! Rows are returned exactly as the store reports them. Columns the facade
//! does not know about and nulls in any column pass through untouched.

use crate::models::filters::SEARCH_COLUMNS;
use crate::models::{ListingFilters, ListingPatch, NewListing};
use crate::store::{to_row, Direction, Filter, ListingStore, Query, Row, StoreError};

/// Default name of the listings table
pub const LISTINGS_TABLE: &str = "properties";

/// Maximum rows returned by the featured listing
pub const FEATURED_LIMIT: usize = 6;

/// Repository error type
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },
}

/// Listing repository
pub struct ListingRepo<'a> {
    store: &'a dyn ListingStore,
    table: &'a str,
}

impl<'a> ListingRepo<'a> {
    pub fn new(store: &'a dyn ListingStore, table: &'a str) -> Self {
        Self { store, table }
    }

    fn query(&self) -> Query {
        Query::table(self.table).select(["*"])
    }

    /// All listings matching `filters`, newest first.
    pub async fn list(&self, filters: &ListingFilters) -> Result<Vec<Row>, RepoError> {
        let query = filters
            .apply(self.query())
            .order("created_at", Direction::Descending);
        let rows = self.store.select(&query).await?;
        tracing::debug!(count = rows.len(), "listed properties");
        Ok(rows)
    }

    /// Up to [`FEATURED_LIMIT`] featured listings, in store order.
    pub async fn featured(&self) -> Result<Vec<Row>, RepoError> {
        let query = self.query().eq("featured", true).limit(FEATURED_LIMIT);
        Ok(self.store.select(&query).await?)
    }

    pub async fn get(&self, id: i64) -> Result<Row, RepoError> {
        let query = self.query().eq("id", id);
        self.store
            .select(&query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound {
                resource: "Property",
                id: id.to_string(),
            })
    }

    /// Insert a listing. Returns the stored row(s) with `id` and
    /// `created_at` assigned.
    pub async fn create(&self, listing: &NewListing) -> Result<Vec<Row>, RepoError> {
        let rows = self.store.insert(self.table, to_row(listing)?).await?;
        tracing::info!(ids = ?ids(&rows), "created property");
        Ok(rows)
    }

    /// Apply the non-null fields of `patch` to listing `id`.
    ///
    /// An empty patch writes nothing and returns the listing as stored.
    pub async fn update(&self, id: i64, patch: &ListingPatch) -> Result<Vec<Row>, RepoError> {
        let changes = to_row(patch)?;
        if changes.is_empty() {
            return Ok(self.store.select(&self.query().eq("id", id)).await?);
        }

        let rows = self
            .store
            .update(self.table, &[Filter::eq("id", id)], changes)
            .await?;
        if rows.is_empty() {
            tracing::debug!(id, "update matched no property");
        } else {
            tracing::info!(id, "updated property");
        }
        Ok(rows)
    }

    /// Delete listing `id`. Deleting a missing id is not an error.
    pub async fn delete(&self, id: i64) -> Result<(), RepoError> {
        let rows = self.store.delete(self.table, &[Filter::eq("id", id)]).await?;
        tracing::info!(id, removed = rows.len(), "deleted property");
        Ok(())
    }

    /// Listings whose title, location, locality or description contains `q`
    /// (case-insensitive).
    pub async fn search(&self, q: &str) -> Result<Vec<Row>, RepoError> {
        let query = self.query().any_ilike(SEARCH_COLUMNS, q);
        Ok(self.store.select(&query).await?)
    }
}

fn ids(rows: &[Row]) -> Vec<&serde_json::Value> {
    rows.iter().filter_map(|r| r.get("id")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    fn new_listing(title: &str) -> NewListing {
        serde_json::from_value(json!({
            "title": title,
            "type": "apartment",
            "purpose": "buy",
            "area": 1400.0,
            "price": 7500000.0,
            "location": "Powai, Mumbai",
            "locality": "Powai",
            "description": "Lake-facing apartment",
            "amenities": ["gym"],
            "images": ["/img/1.jpg"],
            "agent_name": "M. Iyer",
            "agent_phone": "+91 90000 00000"
        }))
        .unwrap()
    }

    fn memory() -> MemoryStore {
        MemoryStore::with_defaults(NewListing::column_defaults())
    }

    /// Records the last query and fails every call
    #[derive(Default)]
    struct FailingStore {
        last: Mutex<Option<Query>>,
    }

    #[async_trait]
    impl ListingStore for FailingStore {
        async fn select(&self, query: &Query) -> Result<Vec<Row>, StoreError> {
            *self.last.lock().unwrap() = Some(query.clone());
            Err(StoreError::Rejected {
                status: 503,
                message: "upstream unavailable".into(),
            })
        }
        async fn insert(&self, _: &str, _: Row) -> Result<Vec<Row>, StoreError> {
            Err(StoreError::InvalidQuery("insert".into()))
        }
        async fn update(&self, _: &str, _: &[Filter], _: Row) -> Result<Vec<Row>, StoreError> {
            Err(StoreError::InvalidQuery("update".into()))
        }
        async fn delete(&self, _: &str, _: &[Filter]) -> Result<Vec<Row>, StoreError> {
            Err(StoreError::InvalidQuery("delete".into()))
        }
    }

    #[tokio::test]
    async fn create_then_get() {
        let store = memory();
        let repo = ListingRepo::new(&store, LISTINGS_TABLE);

        let created = repo.create(&new_listing("A")).await.unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0]["verified"], false);

        let id = created[0]["id"].as_i64().unwrap();
        let fetched = repo.get(id).await.unwrap();
        assert_eq!(fetched, created[0]);
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let store = memory();
        let err = ListingRepo::new(&store, LISTINGS_TABLE)
            .get(42)
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::NotFound { resource: "Property", .. }));
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = memory();
        let repo = ListingRepo::new(&store, LISTINGS_TABLE);
        for title in ["old", "mid", "new"] {
            repo.create(&new_listing(title)).await.unwrap();
        }

        let titles: Vec<String> = repo
            .list(&ListingFilters::default())
            .await
            .unwrap()
            .into_iter()
            .map(|row| row["title"].as_str().unwrap().to_owned())
            .collect();
        assert_eq!(titles, ["new", "mid", "old"]);
    }

    #[tokio::test]
    async fn empty_patch_returns_current_row() {
        let store = memory();
        let repo = ListingRepo::new(&store, LISTINGS_TABLE);
        let id = repo.create(&new_listing("A")).await.unwrap()[0]["id"]
            .as_i64()
            .unwrap();

        let rows = repo.update(id, &ListingPatch::default()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["title"], "A");
    }

    #[tokio::test]
    async fn update_and_delete_missing_are_noops() {
        let store = memory();
        let repo = ListingRepo::new(&store, LISTINGS_TABLE);
        let patch = ListingPatch {
            price: Some(1.0),
            ..Default::default()
        };

        assert!(repo.update(99, &patch).await.unwrap().is_empty());
        repo.delete(99).await.unwrap();
    }

    #[tokio::test]
    async fn featured_query_shape() {
        let store = FailingStore::default();
        let err = ListingRepo::new(&store, LISTINGS_TABLE)
            .featured()
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Store(StoreError::Rejected { status: 503, .. })));

        let query = store.last.lock().unwrap().clone().unwrap();
        assert_eq!(query.filters(), &[Filter::eq("featured", true)]);
        assert_eq!(query.row_limit(), Some(FEATURED_LIMIT));
        assert!(query.ordering().is_none());
    }

    #[tokio::test]
    async fn search_carries_term_as_parameter() {
        let store = FailingStore::default();
        let _ = ListingRepo::new(&store, LISTINGS_TABLE)
            .search("a,b.(c)")
            .await;

        let query = store.last.lock().unwrap().clone().unwrap();
        assert_eq!(
            query.filters(),
            &[Filter::AnyIlike {
                columns: SEARCH_COLUMNS.iter().map(|c| c.to_string()).collect(),
                needle: "a,b.(c)".into(),
            }]
        );
    }

    #[tokio::test]
    async fn stored_rows_pass_through_unchanged() {
        let store = memory();
        let unusual = json!({
            "title": "Plot 14",
            "type": null,
            "description": null,
            "owner_id": "u-981",
            "price": 1200000
        })
        .as_object()
        .cloned()
        .unwrap();
        let inserted = store.insert(LISTINGS_TABLE, unusual).await.unwrap();
        let repo = ListingRepo::new(&store, LISTINGS_TABLE);

        let listed = repo.list(&ListingFilters::default()).await.unwrap();
        assert_eq!(listed, inserted);

        let id = inserted[0]["id"].as_i64().unwrap();
        let fetched = repo.get(id).await.unwrap();
        assert_eq!(fetched["owner_id"], "u-981");
        assert!(fetched["description"].is_null());
        assert_eq!(fetched["price"], 1200000);
    }
}
