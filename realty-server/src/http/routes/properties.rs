//! Property endpoints
//!
//! The static `/properties/featured` and `/properties/search` routes take
//! precedence over `/properties/{id}`.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::http::error::ApiError;
use crate::http::extractors::{ApiJson, ApiQuery, ListingId};
use crate::http::server::AppState;
use crate::models::{ListingFilters, ListingPatch, NewListing, SearchParams};
use crate::store::Row;

/// Collection response, rows as the store returned them
#[derive(Serialize)]
pub struct ListingsResponse {
    pub properties: Vec<Row>,
}

/// Create/update response: message plus the rows echoed by the store
#[derive(Serialize)]
pub struct MutationResponse {
    pub message: &'static str,
    pub data: Vec<Row>,
}

/// Delete response
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// GET /properties - list with optional filters, newest first
async fn list_properties(
    State(state): State<Arc<AppState>>,
    ApiQuery(filters): ApiQuery<ListingFilters>,
) -> Result<Json<ListingsResponse>, ApiError> {
    let properties = state.repo().list(&filters).await?;
    Ok(Json(ListingsResponse { properties }))
}

/// GET /properties/featured - up to six featured listings
async fn featured_properties(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ListingsResponse>, ApiError> {
    let properties = state.repo().featured().await?;
    Ok(Json(ListingsResponse { properties }))
}

/// GET /properties/search?q= - substring search across text columns
async fn search_properties(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Result<Json<ListingsResponse>, ApiError> {
    let properties = state.repo().search(&params.q).await?;
    Ok(Json(ListingsResponse { properties }))
}

/// GET /properties/{id} - a single listing, not wrapped
async fn get_property(
    State(state): State<Arc<AppState>>,
    ListingId(id): ListingId,
) -> Result<Json<Row>, ApiError> {
    let listing = state.repo().get(id).await?;
    Ok(Json(listing))
}

/// POST /properties - create a listing
async fn create_property(
    State(state): State<Arc<AppState>>,
    ApiJson(listing): ApiJson<NewListing>,
) -> Result<Json<MutationResponse>, ApiError> {
    let data = state.repo().create(&listing).await?;
    Ok(Json(MutationResponse {
        message: "Property created successfully",
        data,
    }))
}

/// PUT /properties/{id} - partial update
async fn update_property(
    State(state): State<Arc<AppState>>,
    ListingId(id): ListingId,
    ApiJson(patch): ApiJson<ListingPatch>,
) -> Result<Json<MutationResponse>, ApiError> {
    let data = state.repo().update(id, &patch).await?;
    Ok(Json(MutationResponse {
        message: "Property updated successfully",
        data,
    }))
}

/// DELETE /properties/{id}
async fn delete_property(
    State(state): State<Arc<AppState>>,
    ListingId(id): ListingId,
) -> Result<Json<MessageResponse>, ApiError> {
    state.repo().delete(id).await?;
    Ok(Json(MessageResponse {
        message: "Property deleted successfully",
    }))
}

/// Property routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/properties", get(list_properties).post(create_property))
        .route("/properties/featured", get(featured_properties))
        .route("/properties/search", get(search_properties))
        .route(
            "/properties/{id}",
            get(get_property).put(update_property).delete(delete_property),
        )
}
