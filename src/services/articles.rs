use std::sync::Arc;

use tracing::{debug, instrument};

use super::resolve_mutation;
use crate::authz::Actor;
use crate::error::{AppError, AppResult};
use crate::models::{Article, ArticleView, CreateArticleRequest, UpdateArticleRequest};
use crate::storage::MemoryStore;
use crate::validation::{validate_content, validate_title};

const RESOURCE: &str = "Article";

/// Articles: readable by anyone, mutable by the author or an admin.
#[derive(Clone)]
pub struct ArticleService {
    store: Arc<MemoryStore>,
}

impl ArticleService {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    /// Attach the author's public projection.
    async fn view(&self, article: Article) -> ArticleView {
        let author = self
            .store
            .find_user(article.owner_id)
            .await
            .map(|user| user.to_public());
        ArticleView::new(article, author)
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Vec<ArticleView> {
        let articles = self.store.list_articles().await;
        let mut views = Vec::with_capacity(articles.len());
        for article in articles {
            views.push(self.view(article).await);
        }
        views
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> AppResult<ArticleView> {
        let article = self
            .store
            .find_article(id)
            .await
            .ok_or_else(|| AppError::not_found(RESOURCE, id))?;
        Ok(self.view(article).await)
    }

    #[instrument(skip(self, request))]
    pub async fn create(
        &self,
        actor: &Actor,
        request: CreateArticleRequest,
    ) -> AppResult<ArticleView> {
        validate_title(&request.title)?;
        validate_content(&request.content)?;

        let article = self
            .store
            .create_article(actor.id, request.title, request.content)
            .await;
        debug!(article_id = article.id, "Article created");
        Ok(self.view(article).await)
    }

    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        actor: &Actor,
        id: i64,
        request: UpdateArticleRequest,
    ) -> AppResult<ArticleView> {
        if let Some(title) = &request.title {
            validate_title(title)?;
        }
        if let Some(content) = &request.content {
            validate_content(content)?;
        }

        let outcome = self.store.update_article(id, actor, request).await;
        let article = resolve_mutation(outcome, RESOURCE, "update", id, actor)?;
        Ok(self.view(article).await)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, actor: &Actor, id: i64) -> AppResult<()> {
        let outcome = self.store.delete_article(id, actor).await;
        resolve_mutation(outcome, RESOURCE, "delete", id, actor)?;
        debug!(article_id = id, "Article deleted");
        Ok(())
    }
}
