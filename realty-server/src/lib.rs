//! realty-server: HTTP facade over a hosted table of real-estate listings
//!
//! Requests are translated into queries against an injected
//! [`store::ListingStore`] and the resulting rows are mapped back to JSON.

pub mod http;
pub mod models;
pub mod repo;
pub mod store;

pub use http::{build_router, run_server, AppState, ServerConfig};
pub use repo::{ListingRepo, RepoError, LISTINGS_TABLE};
pub use store::{ListingStore, StoreError};
