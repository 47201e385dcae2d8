//! Article handlers.
//!
//! # Endpoints
//!
//! - `GET /articles`, `GET /articles/{id}` - Public reads
//! - `POST /articles`, `PUT /articles/{id}`, `DELETE /articles/{id}` - Bearer auth,
//!   author or admin only for update/delete
//! - `GET /articles/proxy` - Calls `/articles/headers-echo` on this service
//!   through the propagating client
//! - `GET /articles/headers-echo` - Returns the inbound request headers
//!
//! The proxy pair shows correlation in action: the echoed headers contain
//! the same `x-request-id` the caller sent (or was assigned).

use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header::HOST;
use serde_json::{Map, Value, json};
use tracing::{info, instrument};

use super::{IdPath, JsonBody};
use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::middleware::API_KEY_HEADER;
use crate::models::{
    ApiResponse, ArticleView, CreateArticleRequest, ProxyResponse, UpdateArticleRequest,
};
use crate::state::AppState;

#[instrument(skip_all)]
pub async fn list_articles(State(state): State<AppState>) -> ApiResponse<Vec<ArticleView>> {
    ApiResponse::ok(state.articles.list().await)
}

#[instrument(skip_all, fields(article_id = id))]
pub async fn get_article(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> AppResult<ApiResponse<ArticleView>> {
    Ok(ApiResponse::ok(state.articles.get(id).await?))
}

/// Publish an article authored by the caller.
///
/// # Request Body
///
/// ```json
/// { "title": "Hello", "content": "World" }
/// ```
#[instrument(skip_all, fields(user_id = user.0.id))]
pub async fn create_article(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(request): JsonBody<CreateArticleRequest>,
) -> AppResult<ApiResponse<ArticleView>> {
    let article = state.articles.create(&user.actor(), request).await?;
    Ok(ApiResponse::created(article))
}

#[instrument(skip_all, fields(user_id = user.0.id, article_id = id))]
pub async fn update_article(
    State(state): State<AppState>,
    user: AuthUser,
    IdPath(id): IdPath,
    JsonBody(request): JsonBody<UpdateArticleRequest>,
) -> AppResult<ApiResponse<ArticleView>> {
    let article = state.articles.update(&user.actor(), id, request).await?;
    Ok(ApiResponse::ok(article))
}

#[instrument(skip_all, fields(user_id = user.0.id, article_id = id))]
pub async fn delete_article(
    State(state): State<AppState>,
    user: AuthUser,
    IdPath(id): IdPath,
) -> AppResult<ApiResponse<()>> {
    state.articles.delete(&user.actor(), id).await?;
    Ok(ApiResponse::no_content())
}

/// Call this service's own headers-echo endpoint through the propagating
/// client and report what it received.
///
/// The base URL comes from the inbound `Host` header. The caller's
/// `X-API-Key` is forwarded so the call passes the API key gate.
#[instrument(skip_all)]
pub async fn proxy(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<ApiResponse<ProxyResponse>> {
    let host = headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing Host header".to_string()))?;
    let url = format!("http://{host}/articles/headers-echo");

    let mut builder = state.http.get(&url);
    if let Some(key) = headers.get(API_KEY_HEADER) {
        builder = builder.header(API_KEY_HEADER, key.clone());
    }

    let response = state.http.send(builder).await?;
    let proxied_status = response.status().as_u16();
    let body: Value = response.json().await?;
    info!(url = %url, proxied_status, "Proxy call completed");

    // The echo endpoint wraps its payload in the success envelope.
    let remote_headers = body
        .get("data")
        .and_then(|data| data.get("headers"))
        .cloned()
        .unwrap_or(body);

    Ok(ApiResponse::ok(ProxyResponse {
        proxied_status,
        remote_headers,
    }))
}

/// Return the inbound request headers as a JSON object.
#[instrument(skip_all)]
pub async fn headers_echo(headers: HeaderMap) -> ApiResponse<Value> {
    ApiResponse::ok(json!({ "headers": headers_to_json(&headers) }))
}

fn headers_to_json(headers: &HeaderMap) -> Value {
    let mut map = Map::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        map.insert(name.as_str().to_string(), Value::String(value));
    }
    Value::Object(map)
}
