use std::collections::BTreeMap;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::trace;

use super::Mutation;
use crate::authz::{Actor, OwnedResource, Role, can_mutate};
use crate::error::{AppError, AppResult};
use crate::models::{
    Article, Todo, UpdateArticleRequest, UpdateTodoRequest, User,
};

/// Rows keyed by id, plus the last id handed out.
#[derive(Debug)]
struct Table<T> {
    rows: BTreeMap<i64, T>,
    last_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }
}

impl<T> Table<T> {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

impl<T: OwnedResource + Clone> Table<T> {
    /// Look up, authorize and modify `id` in one step.
    ///
    /// Must be called with the table's write lock held.
    fn mutate(&mut self, id: i64, actor: &Actor, apply: impl FnOnce(&mut T)) -> Mutation<T> {
        let Some(row) = self.rows.get_mut(&id) else {
            return Mutation::Missing;
        };

        if !can_mutate(actor, &*row) {
            return Mutation::Denied;
        }

        apply(row);
        Mutation::Applied(row.clone())
    }

    fn remove(&mut self, id: i64, actor: &Actor) -> Mutation<T> {
        match self.rows.get(&id) {
            None => Mutation::Missing,
            Some(row) if !can_mutate(actor, row) => Mutation::Denied,
            Some(_) => self
                .rows
                .remove(&id)
                .map_or(Mutation::Missing, Mutation::Applied),
        }
    }
}

/// Profile fields that may change on an existing user.
#[derive(Debug, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

/// In-memory store, safe to share across handlers behind an `Arc`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<Table<User>>,
    todos: RwLock<Table<Todo>>,
    articles: RwLock<Table<Article>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Insert a new member account.
    ///
    /// # Errors
    ///
    /// `AppError::Conflict` if the username is taken.
    pub async fn create_user(
        &self,
        username: String,
        email: Option<String>,
        password_hash: String,
    ) -> AppResult<User> {
        let mut users = self.users.write().await;

        if users.rows.values().any(|u| u.username == username) {
            return Err(AppError::Conflict(format!(
                "Username '{username}' is already taken"
            )));
        }

        let user = User {
            id: users.next_id(),
            username,
            email,
            password_hash,
            current_hashed_refresh_token: None,
            role: Role::Member,
        };
        users.rows.insert(user.id, user.clone());
        trace!(user_id = user.id, "User created");

        Ok(user)
    }

    pub async fn find_user(&self, id: i64) -> Option<User> {
        self.users.read().await.rows.get(&id).cloned()
    }

    pub async fn find_user_by_username(&self, username: &str) -> Option<User> {
        self.users
            .read()
            .await
            .rows
            .values()
            .find(|u| u.username == username)
            .cloned()
    }

    /// Apply profile changes to user `id`.
    ///
    /// # Errors
    ///
    /// `AppError::NotFound` if the user is gone, `AppError::Conflict` if the
    /// new username belongs to someone else.
    pub async fn update_user(&self, id: i64, changes: UserChanges) -> AppResult<User> {
        let mut users = self.users.write().await;

        if let Some(username) = &changes.username
            && users
                .rows
                .values()
                .any(|u| u.id != id && &u.username == username)
        {
            return Err(AppError::Conflict(format!(
                "Username '{username}' is already taken"
            )));
        }

        let user = users
            .rows
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("User", id))?;

        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(email) = changes.email {
            user.email = Some(email);
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }

        Ok(user.clone())
    }

    /// Replace the stored refresh-token digest. Returns false if the user is gone.
    pub async fn set_refresh_digest(&self, id: i64, digest: Option<String>) -> bool {
        match self.users.write().await.rows.get_mut(&id) {
            Some(user) => {
                user.current_hashed_refresh_token = digest;
                true
            }
            None => false,
        }
    }

    /// Change a user's role. Returns false if the user is gone.
    pub async fn set_role(&self, id: i64, role: Role) -> bool {
        match self.users.write().await.rows.get_mut(&id) {
            Some(user) => {
                user.role = role;
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Todos
    // =========================================================================

    /// All todos owned by `owner_id`, ordered by id.
    pub async fn list_todos(&self, owner_id: i64) -> Vec<Todo> {
        self.todos
            .read()
            .await
            .rows
            .values()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect()
    }

    /// Todo `id` if it is owned by `owner_id`.
    pub async fn find_todo(&self, id: i64, owner_id: i64) -> Option<Todo> {
        self.todos
            .read()
            .await
            .rows
            .get(&id)
            .filter(|t| t.owner_id == owner_id)
            .cloned()
    }

    pub async fn create_todo(
        &self,
        owner_id: i64,
        title: String,
        description: Option<String>,
    ) -> Todo {
        let mut todos = self.todos.write().await;
        let todo = Todo {
            id: todos.next_id(),
            title,
            description,
            is_done: false,
            owner_id,
        };
        todos.rows.insert(todo.id, todo.clone());
        todo
    }

    pub async fn update_todo(
        &self,
        id: i64,
        actor: &Actor,
        changes: UpdateTodoRequest,
    ) -> Mutation<Todo> {
        self.todos.write().await.mutate(id, actor, |todo| {
            if let Some(title) = changes.title {
                todo.title = title;
            }
            if let Some(description) = changes.description {
                todo.description = Some(description);
            }
            if let Some(is_done) = changes.is_done {
                todo.is_done = is_done;
            }
        })
    }

    pub async fn delete_todo(&self, id: i64, actor: &Actor) -> Mutation<Todo> {
        self.todos.write().await.remove(id, actor)
    }

    // =========================================================================
    // Articles
    // =========================================================================

    pub async fn list_articles(&self) -> Vec<Article> {
        self.articles.read().await.rows.values().cloned().collect()
    }

    pub async fn find_article(&self, id: i64) -> Option<Article> {
        self.articles.read().await.rows.get(&id).cloned()
    }

    pub async fn create_article(&self, owner_id: i64, title: String, content: String) -> Article {
        let mut articles = self.articles.write().await;
        let now = Utc::now();
        let article = Article {
            id: articles.next_id(),
            title,
            content,
            owner_id,
            created_at: now,
            updated_at: now,
        };
        articles.rows.insert(article.id, article.clone());
        article
    }

    pub async fn update_article(
        &self,
        id: i64,
        actor: &Actor,
        changes: UpdateArticleRequest,
    ) -> Mutation<Article> {
        self.articles.write().await.mutate(id, actor, |article| {
            if let Some(title) = changes.title {
                article.title = title;
            }
            if let Some(content) = changes.content {
                article.content = content;
            }
            article.updated_at = Utc::now();
        })
    }

    pub async fn delete_article(&self, id: i64, actor: &Actor) -> Mutation<Article> {
        self.articles.write().await.remove(id, actor)
    }
}
