use chrono::{DateTime, Utc};
use serde::Serialize;

use super::PublicUser;
use crate::authz::OwnedResource;

/// A stored article. Readable by anyone, mutable by its author or an admin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OwnedResource for Article {
    fn owner_id(&self) -> i64 {
        self.owner_id
    }
}

/// Article as returned to clients, with its author's public fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleView {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// `None` when the author account no longer exists.
    pub user: Option<PublicUser>,
}

impl ArticleView {
    pub fn new(article: Article, user: Option<PublicUser>) -> Self {
        Self {
            id: article.id,
            title: article.title,
            content: article.content,
            created_at: article.created_at,
            updated_at: article.updated_at,
            user,
        }
    }
}
