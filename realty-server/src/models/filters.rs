//! Query-string filters for listing and searching
//!
//! This is where optional request parameters become predicates on a
//! [`Query`]. Strings and numbers follow "falsy means absent" (an empty
//! `purpose` or a `min_price` of 0 adds no predicate). The booleans are
//! tri-state: `verified=false` is a real filter, distinct from omitting it.

use serde::{de, Deserialize, Deserializer};

use crate::store::Query;

/// Columns matched by free-text search
pub const SEARCH_COLUMNS: [&str; 4] = ["title", "location", "locality", "description"];

/// Optional filters accepted by `GET /properties`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingFilters {
    pub purpose: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub locality: Option<String>,
    #[serde(default, deserialize_with = "finite_f64")]
    pub min_price: Option<f64>,
    #[serde(default, deserialize_with = "finite_f64")]
    pub max_price: Option<f64>,
    pub bedrooms: Option<i64>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub verified: Option<bool>,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub featured: Option<bool>,
}

impl ListingFilters {
    /// Add one predicate per supplied filter, all ANDed together.
    pub fn apply(&self, mut query: Query) -> Query {
        if let Some(purpose) = non_empty(&self.purpose) {
            query = query.eq("purpose", purpose);
        }
        if let Some(kind) = non_empty(&self.kind) {
            query = query.eq("type", kind);
        }
        if let Some(locality) = non_empty(&self.locality) {
            query = query.ilike("locality", locality);
        }
        if let Some(min) = self.min_price.filter(|p| *p != 0.0) {
            query = query.gte("price", min);
        }
        if let Some(max) = self.max_price.filter(|p| *p != 0.0) {
            query = query.lte("price", max);
        }
        if let Some(bedrooms) = self.bedrooms.filter(|b| *b != 0) {
            query = query.eq("bedrooms", bedrooms);
        }
        if let Some(verified) = self.verified {
            query = query.eq("verified", verified);
        }
        if let Some(featured) = self.featured {
            query = query.eq("featured", featured);
        }
        query
    }
}

/// Parameters for `GET /properties/search`
#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    pub q: String,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Price bounds must be real numbers: `inf` and `NaN` parse as `f64` but
/// cannot be compared against a column.
fn finite_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<f64>::deserialize(deserializer)? {
        Some(value) if !value.is_finite() => Err(de::Error::custom(format!(
            "'{}' is not a finite number",
            value
        ))),
        other => Ok(other),
    }
}

/// Accept the usual spellings of a boolean query parameter.
fn flexible_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };

    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "t" | "y" => Ok(Some(true)),
        "false" | "0" | "no" | "off" | "f" | "n" => Ok(Some(false)),
        _ => Err(de::Error::custom(format!(
            "'{}' is not a valid boolean",
            raw
        ))),
    }
}
