//! The CMS route declarations
//!
//! Order matters: the first matching pattern wins, so the article routes come before
//! the `/api/*rest` catch-all.

use crate::articles::handlers as articles;
use crate::articles::SharedStore;
use crate::config::Config;
use crate::error::RouteError;
use crate::handler::static_files::files_with_fallback;
use crate::handler::{from_fn, RequestContext, SharedHandler};
use crate::http::{response, Method};
use crate::middleware::{compose, AccessLog, BasicAuth, SharedMiddleware, Timeout};
use crate::routing::{any, get, MethodRouter, RouteTable};
use hyper::body::Bytes;
use hyper::StatusCode;
use std::sync::Arc;

fn text(body: &'static str) -> SharedHandler {
    from_fn(move |_ctx: RequestContext| async move { Ok(response::text(StatusCode::OK, body)) })
}

/// Build the route table; `app_shell` is the document served for unknown admin paths
pub fn cms_routes(
    config: &Config,
    store: &SharedStore,
    app_shell: Bytes,
) -> Result<RouteTable, RouteError> {
    let auth: SharedMiddleware = Arc::new(BasicAuth::new(
        Arc::new(config.credentials()),
        config.auth.realm.clone(),
    ));
    let protect = |handler: SharedHandler| compose(handler, std::slice::from_ref(&auth));

    RouteTable::builder()
        .route("/healthz", get(text("ok")))
        .route(
            "/api/articles",
            get(articles::index(store)).on(Method::Post, protect(articles::create(store))),
        )
        .route(
            "/api/articles/:id",
            MethodRouter::new()
                .on(Method::Get, articles::show(store))
                .on(Method::Post, protect(articles::update(store)))
                .fallback(articles::not_found()),
        )
        .route("/api/*rest", any(articles::not_found()))
        .route(
            "/admin/*filename",
            get(protect(files_with_fallback(
                config.asset_root(),
                "filename",
                app_shell,
            ))),
        )
        .route("/", get(text("The public site is not published yet.")))
        .build()
}

/// Global chain: logging outermost so it records the final status, then the deadline
pub fn global_middleware(config: &Config) -> Vec<SharedMiddleware> {
    global_middleware_with(config, AccessLog::new(config.access_log_format()))
}

/// [`global_middleware`] with a caller-built access log
pub fn global_middleware_with(config: &Config, access_log: AccessLog) -> Vec<SharedMiddleware> {
    let mut chain: Vec<SharedMiddleware> = Vec::new();
    if config.logging.access_log {
        chain.push(Arc::new(access_log));
    }
    chain.push(Arc::new(Timeout::new(config.request_timeout())));
    chain
}
