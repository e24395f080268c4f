//! Article API handlers
//!
//! Each factory captures the store and returns a route handler. Bodies are JSON:
//! `{"articles": [...]}`, `{"article": {...}}` or `{"message": "..."}`.

use super::{ArticleDraft, DraftError, SharedStore};
use crate::handler::{from_fn, RequestContext, SharedHandler};
use crate::http::response;
use crate::logger;
use hyper::StatusCode;
use serde_json::json;
use std::sync::Arc;

pub const NOT_FOUND_MESSAGE: &str = "Article not found";
pub const UNPARSABLE_MESSAGE: &str = "Could not parse form data into an article";

/// `GET /api/articles`
pub fn index(store: &SharedStore) -> SharedHandler {
    let store = Arc::clone(store);
    from_fn(move |_ctx: RequestContext| {
        let store = Arc::clone(&store);
        async move {
            let articles = store.list().await?;
            Ok(response::json(StatusCode::OK, &json!({ "articles": articles })))
        }
    })
}

/// `GET /api/articles/:id`
pub fn show(store: &SharedStore) -> SharedHandler {
    let store = Arc::clone(store);
    from_fn(move |ctx: RequestContext| {
        let store = Arc::clone(&store);
        async move {
            let id = ctx.param("id").unwrap_or_default().to_string();
            Ok(match store.get(id).await? {
                Some(article) => response::json(StatusCode::OK, &json!({ "article": article })),
                None => response::json_message(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE),
            })
        }
    })
}

/// `POST /api/articles`: a new, empty article for the editor to fill in
pub fn create(store: &SharedStore) -> SharedHandler {
    let store = Arc::clone(store);
    from_fn(move |_ctx: RequestContext| {
        let store = Arc::clone(&store);
        async move {
            let article = store.create().await?;
            logger::log_info(&format!("Created article {}", article.id));
            Ok(response::json(StatusCode::OK, &json!({ "article": article })))
        }
    })
}

/// `POST /api/articles/:id`
pub fn update(store: &SharedStore) -> SharedHandler {
    let store = Arc::clone(store);
    from_fn(move |ctx: RequestContext| {
        let store = Arc::clone(&store);
        async move {
            let draft = match ArticleDraft::from_json(ctx.body()) {
                Ok(draft) => draft,
                Err(DraftError::Malformed(e)) => {
                    logger::log_debug(&format!("Rejected article update: {e}"));
                    return Ok(response::bad_request("Request body is not valid JSON"));
                }
                Err(DraftError::MissingField(_)) => {
                    return Ok(response::json_message(
                        StatusCode::UNPROCESSABLE_ENTITY,
                        UNPARSABLE_MESSAGE,
                    ));
                }
            };

            let id = ctx.param("id").unwrap_or_default().to_string();
            Ok(match store.update(id, draft).await? {
                Some(article) => response::json(StatusCode::OK, &json!({ "article": article })),
                None => response::json_message(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE),
            })
        }
    })
}

/// Catch-all for unknown API paths and methods
pub fn not_found() -> SharedHandler {
    from_fn(|_ctx: RequestContext| async {
        Ok(response::json_message(StatusCode::NOT_FOUND, "Not found"))
    })
}
