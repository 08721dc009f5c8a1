//! Payloads that create or modify listings
//!
//! Stored listings are not modelled here: rows come back from the store as
//! JSON maps and are returned to clients exactly as the store reports them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::Row;

/// Payload for creating a listing.
///
/// Missing required fields fail deserialization. Optional fields that were
/// not supplied are left out of the serialized row so the store applies its
/// own defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewListing {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub purpose: String,
    pub area: f64,
    pub price: f64,
    pub location: String,
    pub locality: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub furnishing: Option<String>,
    pub description: String,
    pub amenities: Vec<String>,
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    pub agent_name: String,
    pub agent_phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nearby_schools: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nearby_hospitals: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nearby_metro: Option<Vec<String>>,
}

impl NewListing {
    /// Column defaults the hosted table applies when a create payload
    /// leaves them out.
    ///
    /// Backends without a schema of their own (the in-memory store) use
    /// these to produce the same rows the hosted table would.
    pub fn column_defaults() -> Row {
        let mut row = Row::new();
        row.insert("verified".into(), Value::Bool(false));
        row.insert("featured".into(), Value::Bool(false));
        row
    }
}

/// Partial update of a listing.
///
/// Absent and explicit `null` fields both deserialize to `None` and are
/// never sent to the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub furnishing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amenities: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nearby_schools: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nearby_hospitals: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nearby_metro: Option<Vec<String>>,
}
