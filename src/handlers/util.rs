//! Shared extractors for handlers.
//!
//! Both reject with the failure envelope instead of axum's plain-text
//! rejections.

use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Integer `{id}` path segment.
///
/// A non-integer segment is rejected with 400 before the handler runs.
#[derive(Debug, Clone, Copy)]
pub struct IdPath(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for IdPath {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        parse_id(&raw)
            .map(IdPath)
            .map_err(IntoResponse::into_response)
    }
}

fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse().map_err(|_| {
        AppError::BadRequest(format!("Validation failed (id '{raw}' is not an integer)"))
    })
}

/// JSON request body deserialized with sanitized error messages.
///
/// Body-level rejections (such as the size limit) keep their own status.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;

        serde_json::from_slice(&bytes)
            .map(JsonBody)
            .map_err(|e| AppError::from(e).into_response())
    }
}
