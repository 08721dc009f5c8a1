//! Domain models
//!
//! Request payloads are shape-checked by serde when they are deserialized.
//! Beyond that the facade passes values through to the store untouched, and
//! stored rows come back as [`crate::store::Row`] maps without reshaping.

pub mod filters;
pub mod listing;
pub mod validation;

pub use filters::{ListingFilters, SearchParams};
pub use listing::{ListingPatch, NewListing};
pub use validation::ValidationError;
