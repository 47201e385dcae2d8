use std::sync::Arc;

use tracing::{debug, instrument};

use super::resolve_mutation;
use crate::authz::Actor;
use crate::error::{AppError, AppResult};
use crate::models::{CreateTodoRequest, Todo, UpdateTodoRequest};
use crate::storage::MemoryStore;
use crate::validation::validate_title;

const RESOURCE: &str = "Todo";

/// Todos of the authenticated caller.
///
/// Reads are always scoped to the caller, admins included. Updates and
/// deletes go through the ownership rule in storage.
#[derive(Clone)]
pub struct TodoService {
    store: Arc<MemoryStore>,
}

impl TodoService {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, actor: &Actor) -> Vec<Todo> {
        let todos = self.store.list_todos(actor.id).await;
        debug!(count = todos.len(), "Listed todos");
        todos
    }

    #[instrument(skip(self))]
    pub async fn get(&self, actor: &Actor, id: i64) -> AppResult<Todo> {
        self.store
            .find_todo(id, actor.id)
            .await
            .ok_or_else(|| AppError::not_found(RESOURCE, id))
    }

    #[instrument(skip(self, request))]
    pub async fn create(&self, actor: &Actor, request: CreateTodoRequest) -> AppResult<Todo> {
        validate_title(&request.title)?;

        let todo = self
            .store
            .create_todo(actor.id, request.title, request.description)
            .await;
        debug!(todo_id = todo.id, "Todo created");
        Ok(todo)
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        actor: &Actor,
        id: i64,
        request: UpdateTodoRequest,
    ) -> AppResult<Todo> {
        if let Some(title) = &request.title {
            validate_title(title)?;
        }

        let outcome = self.store.update_todo(id, actor, request).await;
        resolve_mutation(outcome, RESOURCE, "update", id, actor)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, actor: &Actor, id: i64) -> AppResult<()> {
        let outcome = self.store.delete_todo(id, actor).await;
        resolve_mutation(outcome, RESOURCE, "delete", id, actor)?;
        debug!(todo_id = id, "Todo deleted");
        Ok(())
    }
}
