//! Todo handlers. Every endpoint requires a bearer token and only ever sees
//! the caller's own todos.

use axum::extract::State;
use tracing::instrument;

use super::{IdPath, JsonBody};
use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::models::{ApiResponse, CreateTodoRequest, Todo, UpdateTodoRequest};
use crate::state::AppState;

#[instrument(skip_all, fields(user_id = user.0.id))]
pub async fn list_todos(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResponse<Vec<Todo>> {
    ApiResponse::ok(state.todos.list(&user.actor()).await)
}

#[instrument(skip_all, fields(user_id = user.0.id, todo_id = id))]
pub async fn get_todo(
    State(state): State<AppState>,
    user: AuthUser,
    IdPath(id): IdPath,
) -> AppResult<ApiResponse<Todo>> {
    Ok(ApiResponse::ok(state.todos.get(&user.actor(), id).await?))
}

/// Create a todo owned by the caller.
///
/// # Request Body
///
/// ```json
/// { "title": "Buy milk", "description": "2 litres" }
/// ```
#[instrument(skip_all, fields(user_id = user.0.id))]
pub async fn create_todo(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(request): JsonBody<CreateTodoRequest>,
) -> AppResult<ApiResponse<Todo>> {
    let todo = state.todos.create(&user.actor(), request).await?;
    Ok(ApiResponse::created(todo))
}

/// Partially update a todo.
///
/// # Request Body
///
/// ```json
/// { "title": "Buy oat milk", "isDone": true }
/// ```
#[instrument(skip_all, fields(user_id = user.0.id, todo_id = id))]
pub async fn update_todo(
    State(state): State<AppState>,
    user: AuthUser,
    IdPath(id): IdPath,
    JsonBody(request): JsonBody<UpdateTodoRequest>,
) -> AppResult<ApiResponse<Todo>> {
    let todo = state.todos.update(&user.actor(), id, request).await?;
    Ok(ApiResponse::ok(todo))
}

#[instrument(skip_all, fields(user_id = user.0.id, todo_id = id))]
pub async fn delete_todo(
    State(state): State<AppState>,
    user: AuthUser,
    IdPath(id): IdPath,
) -> AppResult<ApiResponse<()>> {
    state.todos.delete(&user.actor(), id).await?;
    Ok(ApiResponse::no_content())
}
