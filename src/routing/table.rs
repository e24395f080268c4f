//! Route table: ordered `(pattern, methods, handler)` entries
//!
//! Resolution is pure declaration order. The first entry whose pattern matches the
//! path decides the outcome, even when a later entry is more specific. Declare exact
//! routes before the wildcard routes that would shadow them.

use super::pattern::{Params, RoutePattern};
use crate::error::RouteError;
use crate::handler::SharedHandler;
use crate::http::{Method, MethodSet};
use std::collections::BTreeMap;
use std::fmt;

/// Per-method handler map with an optional default branch
#[derive(Clone, Default)]
pub struct MethodRouter {
    handlers: BTreeMap<Method, SharedHandler>,
    fallback: Option<SharedHandler>,
}

impl MethodRouter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on(mut self, method: Method, handler: SharedHandler) -> Self {
        self.handlers.insert(method, handler);
        self
    }

    /// Handler for methods with no entry, including unsupported ones
    #[must_use]
    pub fn fallback(mut self, handler: SharedHandler) -> Self {
        self.fallback = Some(handler);
        self
    }

    /// Methods with an explicit handler; HEAD is implied by GET
    pub fn allowed(&self) -> MethodSet {
        let set = MethodSet::of(&self.handlers.keys().copied().collect::<Vec<_>>());
        if self.handlers.contains_key(&Method::Get) {
            set.with(Method::Head)
        } else {
            set
        }
    }

    /// No method handlers and no fallback
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty() && self.fallback.is_none()
    }

    fn select(&self, method: Option<Method>) -> Option<&SharedHandler> {
        let explicit = method.and_then(|m| {
            self.handlers.get(&m).or_else(|| {
                (m == Method::Head)
                    .then(|| self.handlers.get(&Method::Get))
                    .flatten()
            })
        });
        explicit.or(self.fallback.as_ref())
    }
}

impl fmt::Debug for MethodRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRouter")
            .field("methods", &self.handlers.keys().collect::<Vec<_>>())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

/// What a route dispatches to
#[derive(Clone)]
pub enum Endpoint {
    /// One handler for every method
    Any(SharedHandler),
    /// Dispatch by method
    Methods(MethodRouter),
}

impl Endpoint {
    pub fn methods(&self) -> MethodSet {
        match self {
            Self::Any(_) => MethodSet::ANY,
            Self::Methods(router) => router.allowed(),
        }
    }
}

impl From<MethodRouter> for Endpoint {
    fn from(router: MethodRouter) -> Self {
        Self::Methods(router)
    }
}

impl From<SharedHandler> for Endpoint {
    fn from(handler: SharedHandler) -> Self {
        Self::Any(handler)
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any(_) => f.write_str("Any"),
            Self::Methods(router) => router.fmt(f),
        }
    }
}

pub fn any(handler: SharedHandler) -> Endpoint {
    Endpoint::Any(handler)
}

pub fn get(handler: SharedHandler) -> MethodRouter {
    MethodRouter::new().on(Method::Get, handler)
}

pub fn post(handler: SharedHandler) -> MethodRouter {
    MethodRouter::new().on(Method::Post, handler)
}

pub fn put(handler: SharedHandler) -> MethodRouter {
    MethodRouter::new().on(Method::Put, handler)
}

pub fn patch(handler: SharedHandler) -> MethodRouter {
    MethodRouter::new().on(Method::Patch, handler)
}

pub fn delete(handler: SharedHandler) -> MethodRouter {
    MethodRouter::new().on(Method::Delete, handler)
}

/// One declared route, immutable once built
#[derive(Debug)]
pub struct RouteEntry {
    pattern: RoutePattern,
    endpoint: Endpoint,
}

impl RouteEntry {
    pub const fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    /// Allowed methods; empty means every method
    pub fn methods(&self) -> MethodSet {
        self.endpoint.methods()
    }
}

/// A resolved route
pub struct RouteMatch<'a> {
    pub handler: &'a SharedHandler,
    pub params: Params,
    pub pattern: &'a RoutePattern,
}

impl fmt::Debug for RouteMatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMatch")
            .field("pattern", &self.pattern.as_str())
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Outcome of looking a request up in the table
#[derive(Debug)]
pub enum Resolution<'a> {
    Matched(RouteMatch<'a>),
    /// The first matching pattern has no handler for this method and no default branch
    MethodNotAllowed {
        pattern: &'a RoutePattern,
        allowed: MethodSet,
    },
    NotFound,
}

/// Ordered routes, read-only after construction
#[derive(Debug, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::default()
    }

    /// Build from a declaration list, preserving its order
    pub fn from_routes<I, P>(routes: I) -> Result<Self, RouteError>
    where
        I: IntoIterator<Item = (P, Endpoint)>,
        P: AsRef<str>,
    {
        routes
            .into_iter()
            .fold(Self::builder(), |builder, (pattern, endpoint)| {
                builder.route(pattern.as_ref(), endpoint)
            })
            .build()
    }

    /// Look a request up, reporting a method mismatch separately from a miss
    pub fn lookup<'a>(&'a self, method: Option<Method>, path: &str) -> Resolution<'a> {
        for entry in &self.entries {
            let Some(params) = entry.pattern.matches(path) else {
                continue;
            };
            let handler = match &entry.endpoint {
                Endpoint::Any(handler) => Some(handler),
                Endpoint::Methods(router) => router.select(method),
            };
            return match handler {
                Some(handler) => Resolution::Matched(RouteMatch {
                    handler,
                    params,
                    pattern: &entry.pattern,
                }),
                None => Resolution::MethodNotAllowed {
                    pattern: &entry.pattern,
                    allowed: entry.methods(),
                },
            };
        }
        Resolution::NotFound
    }

    /// The handler and captured parameters for a request, if any route accepts it
    pub fn resolve<'a>(&'a self, method: Option<Method>, path: &str) -> Option<RouteMatch<'a>> {
        match self.lookup(method, path) {
            Resolution::Matched(found) => Some(found),
            Resolution::MethodNotAllowed { .. } | Resolution::NotFound => None,
        }
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Collects route declarations; patterns are compiled in [`RouteTableBuilder::build`]
#[derive(Debug, Default)]
pub struct RouteTableBuilder {
    routes: Vec<(String, Endpoint)>,
}

impl RouteTableBuilder {
    #[must_use]
    pub fn route(mut self, pattern: &str, endpoint: impl Into<Endpoint>) -> Self {
        self.routes.push((pattern.to_string(), endpoint.into()));
        self
    }

    /// Compile every pattern; the first invalid route aborts the build
    ///
    /// A method map that could never match any request is rejected too.
    pub fn build(self) -> Result<RouteTable, RouteError> {
        let entries = self
            .routes
            .into_iter()
            .map(|(pattern, endpoint)| -> Result<RouteEntry, RouteError> {
                if let Endpoint::Methods(router) = &endpoint {
                    if router.is_empty() {
                        return Err(RouteError::NoHandlers { pattern });
                    }
                }
                Ok(RouteEntry {
                    pattern: RoutePattern::compile(&pattern)?,
                    endpoint,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RouteTable { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PatternError;
    use crate::handler::test_support::{body_string, ctx};
    use crate::handler::from_fn;
    use crate::http::response;
    use hyper::StatusCode;
    use std::sync::Arc;

    fn named(name: &'static str) -> SharedHandler {
        from_fn(move |_| async move { Ok(response::text(StatusCode::OK, name)) })
    }

    async fn name_of(found: &RouteMatch<'_>) -> String {
        let response = found.handler.call(ctx("GET", "/")).await.unwrap();
        body_string(response).await
    }

    #[tokio::test]
    async fn test_first_declared_wins() {
        let table = RouteTable::builder()
            .route("/admin/main.js", any(named("bundle")))
            .route("/admin/*filename", any(named("files")))
            .build()
            .unwrap();
        let found = table.resolve(Some(Method::Get), "/admin/main.js").unwrap();
        assert_eq!(name_of(&found).await, "bundle");
        assert!(found.params.is_empty());

        let reversed = RouteTable::builder()
            .route("/admin/*filename", any(named("files")))
            .route("/admin/main.js", any(named("bundle")))
            .build()
            .unwrap();
        let found = reversed.resolve(Some(Method::Get), "/admin/main.js").unwrap();
        assert_eq!(name_of(&found).await, "files");
        assert_eq!(found.params.get("filename"), Some("main.js"));
    }

    #[tokio::test]
    async fn test_method_dispatch_with_default_branch() {
        let table = RouteTable::builder()
            .route(
                "/api/articles/:id",
                get(named("show"))
                    .on(Method::Post, named("update"))
                    .fallback(named("not-found")),
            )
            .build()
            .unwrap();

        let found = table.resolve(Some(Method::Post), "/api/articles/7").unwrap();
        assert_eq!(name_of(&found).await, "update");
        assert_eq!(found.params.get("id"), Some("7"));

        let found = table.resolve(Some(Method::Delete), "/api/articles/7").unwrap();
        assert_eq!(name_of(&found).await, "not-found");

        let found = table.resolve(None, "/api/articles/7").unwrap();
        assert_eq!(name_of(&found).await, "not-found");
    }

    #[test]
    fn test_method_rejected_without_default() {
        let table = RouteTable::builder()
            .route("/api/articles", get(named("index")))
            .route("/api/*rest", any(named("api-not-found")))
            .build()
            .unwrap();

        match table.lookup(Some(Method::Put), "/api/articles") {
            Resolution::MethodNotAllowed { pattern, allowed } => {
                assert_eq!(pattern.as_str(), "/api/articles");
                assert_eq!(allowed.allow_header(), "GET, HEAD");
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
        assert!(table.resolve(Some(Method::Put), "/api/articles").is_none());
    }

    #[tokio::test]
    async fn test_head_falls_back_to_get() {
        let table = RouteTable::from_routes([("/", Endpoint::from(get(named("home"))))]).unwrap();
        let found = table.resolve(Some(Method::Head), "/").unwrap();
        assert_eq!(name_of(&found).await, "home");
    }

    #[test]
    fn test_any_accepts_unsupported_methods() {
        let table = RouteTable::builder()
            .route("/hook", any(named("hook")))
            .build()
            .unwrap();
        assert!(table.resolve(None, "/hook").is_some());
        assert!(table.entries()[0].methods().is_any());
    }

    #[test]
    fn test_not_found() {
        let table = RouteTable::builder()
            .route("/articles/:id", any(named("show")))
            .build()
            .unwrap();
        assert!(matches!(
            table.lookup(Some(Method::Get), "/articles/1/edit"),
            Resolution::NotFound
        ));
        assert!(matches!(
            table.lookup(Some(Method::Get), "/nothing"),
            Resolution::NotFound
        ));
    }

    #[test]
    fn test_invalid_pattern_fails_build() {
        let err = RouteTable::builder()
            .route("/ok", any(named("ok")))
            .route("/bad/*rest/tail", any(named("bad")))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            RouteError::Pattern(PatternError::WildcardNotLast { .. })
        ));
    }

    #[test]
    fn test_empty_method_router_fails_build() {
        let err = RouteTable::builder()
            .route("/ok", get(named("ok")))
            .route("/nothing", MethodRouter::new())
            .build()
            .unwrap_err();
        match err {
            RouteError::NoHandlers { pattern } => assert_eq!(pattern, "/nothing"),
            other => panic!("unexpected error: {other:?}"),
        }

        let fallback_only = RouteTable::builder()
            .route("/catch", MethodRouter::new().fallback(named("catch")))
            .build()
            .unwrap();
        assert!(fallback_only.resolve(Some(Method::Put), "/catch").is_some());
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let table = RouteTable::builder()
            .route("/api/articles/:id", get(named("show")))
            .route("/admin/*filename", any(named("files")))
            .build()
            .unwrap();

        for path in ["/api/articles/42", "/admin/css/app.css", "/missing"] {
            let first = table.resolve(Some(Method::Get), path);
            for _ in 0..3 {
                let again = table.resolve(Some(Method::Get), path);
                match (&first, &again) {
                    (Some(a), Some(b)) => {
                        assert!(Arc::ptr_eq(a.handler, b.handler));
                        assert_eq!(a.params, b.params);
                    }
                    (None, None) => {}
                    _ => panic!("resolution of {path} changed"),
                }
            }
        }
    }
}
