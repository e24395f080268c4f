//! Articles: the CMS content model and its storage seam
//!
//! Handlers only see [`ArticleStore`]. The bundled [`MemoryArticleStore`] keeps
//! everything in process; a SQL-backed store would implement the same trait.

pub mod handlers;

use crate::error::HandlerError;
use crate::handler::BoxFuture;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable fields of an article
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleDraft {
    pub slug: String,
    pub title: String,
    pub body: String,
}

/// Why a request body could not become an [`ArticleDraft`]
#[derive(Debug, Error)]
pub enum DraftError {
    #[error("request body is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("missing or non-string field `{0}`")]
    MissingField(&'static str),
}

impl ArticleDraft {
    /// Parse a JSON object carrying string `slug`, `title` and `body` fields
    ///
    /// Other fields, such as `id` or timestamps echoed back by the editor, are ignored.
    pub fn from_json(body: &[u8]) -> Result<Self, DraftError> {
        let value: Value = serde_json::from_slice(body)?;
        let field = |name: &'static str| {
            value
                .get(name)
                .and_then(Value::as_str)
                .map(ToString::to_string)
                .ok_or(DraftError::MissingField(name))
        };
        Ok(Self {
            slug: field("slug")?,
            title: field("title")?,
            body: field("body")?,
        })
    }
}

/// Persistence failure
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("article store unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for HandlerError {
    fn from(err: StoreError) -> Self {
        Self::Internal(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Article persistence, shared by every request
pub trait ArticleStore: Send + Sync + 'static {
    /// All articles, newest first
    fn list(&self) -> BoxFuture<StoreResult<Vec<Article>>>;
    fn get(&self, id: String) -> BoxFuture<StoreResult<Option<Article>>>;
    /// Insert an article with empty fields
    fn create(&self) -> BoxFuture<StoreResult<Article>>;
    /// Replace the editable fields; `None` if `id` is unknown
    fn update(&self, id: String, draft: ArticleDraft) -> BoxFuture<StoreResult<Option<Article>>>;
}

pub type SharedStore = Arc<dyn ArticleStore>;

#[derive(Debug, Default)]
struct Articles {
    next_id: u64,
    /// Creation order, oldest first
    rows: Vec<Article>,
}

/// In-process store; ids are sequential
#[derive(Debug, Default)]
pub struct MemoryArticleStore {
    inner: Arc<RwLock<Articles>>,
}

impl MemoryArticleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ArticleStore for MemoryArticleStore {
    fn list(&self) -> BoxFuture<StoreResult<Vec<Article>>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let articles = inner.read().await;
            Ok(articles.rows.iter().rev().cloned().collect())
        })
    }

    fn get(&self, id: String) -> BoxFuture<StoreResult<Option<Article>>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let articles = inner.read().await;
            Ok(articles.rows.iter().find(|a| a.id == id).cloned())
        })
    }

    fn create(&self) -> BoxFuture<StoreResult<Article>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let mut articles = inner.write().await;
            articles.next_id += 1;
            let now = Utc::now();
            let article = Article {
                id: articles.next_id.to_string(),
                slug: String::new(),
                title: String::new(),
                body: String::new(),
                created_at: now,
                updated_at: now,
            };
            articles.rows.push(article.clone());
            Ok(article)
        })
    }

    fn update(&self, id: String, draft: ArticleDraft) -> BoxFuture<StoreResult<Option<Article>>> {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let mut articles = inner.write().await;
            let Some(article) = articles.rows.iter_mut().find(|a| a.id == id) else {
                return Ok(None);
            };
            article.slug = draft.slug;
            article.title = draft.title;
            article.body = draft.body;
            article.updated_at = Utc::now();
            Ok(Some(article.clone()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_from_json() {
        let draft =
            ArticleDraft::from_json(br#"{"id":"7","slug":"hello","title":"Hello","body":"Hi"}"#)
                .unwrap();
        assert_eq!(draft.slug, "hello");
        assert_eq!(draft.title, "Hello");
        assert_eq!(draft.body, "Hi");
    }

    #[test]
    fn test_draft_errors() {
        assert!(matches!(
            ArticleDraft::from_json(b"{not json"),
            Err(DraftError::Malformed(_))
        ));
        assert!(matches!(
            ArticleDraft::from_json(br#"{"slug":"a","title":"b"}"#),
            Err(DraftError::MissingField("body"))
        ));
        assert!(matches!(
            ArticleDraft::from_json(br#"{"slug":"a","title":2,"body":"c"}"#),
            Err(DraftError::MissingField("title"))
        ));
        assert!(matches!(
            ArticleDraft::from_json(b"[]"),
            Err(DraftError::MissingField("slug"))
        ));
    }

    #[tokio::test]
    async fn test_memory_store_lifecycle() {
        let store = MemoryArticleStore::new();
        let first = store.create().await.unwrap();
        let second = store.create().await.unwrap();
        assert_ne!(first.id, second.id);
        assert!(first.title.is_empty());

        let listed = store.list().await.unwrap();
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);

        let draft = ArticleDraft {
            slug: "launch".to_string(),
            title: "Launch".to_string(),
            body: "We are live".to_string(),
        };
        let updated = store.update(first.id.clone(), draft).await.unwrap().unwrap();
        assert_eq!(updated.slug, "launch");
        assert!(updated.updated_at >= first.updated_at);
        assert_eq!(store.get(first.id).await.unwrap(), Some(updated));

        let missing = ArticleDraft {
            slug: String::new(),
            title: String::new(),
            body: String::new(),
        };
        assert_eq!(store.update("999".to_string(), missing).await.unwrap(), None);
        assert_eq!(store.get("999".to_string()).await.unwrap(), None);
    }
}
