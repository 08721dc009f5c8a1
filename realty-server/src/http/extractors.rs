//! Custom Axum extractors
//!
//! Wrap axum's own extractors so that every rejection is reported as an
//! [`ApiError`] with a `{"detail": ...}` body.

use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;

use super::error::ApiError;
use crate::models::ValidationError;

/// JSON body
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ValidationError::Body {
                reason: rejection.body_text(),
            })?;
        Ok(Self(value))
    }
}

/// Query string
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ValidationError::Query {
                reason: rejection.body_text(),
            })?;
        Ok(Self(value))
    }
}

/// Integer listing id from the path
pub struct ListingId(pub i64);

impl<S> FromRequestParts<S> for ListingId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ValidationError::Path {
                field: "property id",
                reason: rejection.body_text(),
            })?;

        let id = raw.parse::<i64>().map_err(|_| ValidationError::Path {
            field: "property id",
            reason: format!("'{}' is not an integer", raw),
        })?;
        Ok(Self(id))
    }
}
