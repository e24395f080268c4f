//! Middleware chain
//!
//! A middleware receives the request and a [`Next`] for the rest of the chain. `Next`
//! is consumed by [`Next::run`], so a layer forwards at most once; returning without
//! calling it short-circuits everything inside.
//!
//! # Data Flow
//! ```text
//! compose(handler, [logging, timeout, auth])
//!
//! request  → logging → timeout → auth → handler
//! response ← logging ← timeout ← auth ← handler
//! ```

pub mod basic_auth;
pub mod logging;
pub mod timeout;

use crate::handler::{BoxFuture, Handler, HandlerResult, RequestContext, SharedHandler};
use std::future::Future;
use std::sync::Arc;

pub use basic_auth::BasicAuth;
pub use logging::AccessLog;
pub use timeout::Timeout;

/// A wrapper that may inspect, transform or short-circuit a request
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, ctx: RequestContext, next: Next) -> BoxFuture<HandlerResult>;
}

impl<F, Fut> Middleware for F
where
    F: Fn(RequestContext, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn handle(&self, ctx: RequestContext, next: Next) -> BoxFuture<HandlerResult> {
        Box::pin(self(ctx, next))
    }
}

pub type SharedMiddleware = Arc<dyn Middleware>;

/// Wrap an async closure as a shared middleware
pub fn from_fn<F, Fut>(f: F) -> SharedMiddleware
where
    F: Fn(RequestContext, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(f)
}

/// The remainder of the chain after the current middleware
pub struct Next {
    inner: SharedHandler,
}

impl Next {
    /// Continue with the next layer
    pub fn run(self, ctx: RequestContext) -> BoxFuture<HandlerResult> {
        self.inner.call(ctx)
    }
}

struct Layer {
    middleware: SharedMiddleware,
    inner: SharedHandler,
}

impl Handler for Layer {
    fn call(&self, ctx: RequestContext) -> BoxFuture<HandlerResult> {
        let next = Next {
            inner: Arc::clone(&self.inner),
        };
        self.middleware.handle(ctx, next)
    }
}

/// Wrap `handler` so that `middlewares[0]` sees the request first
pub fn compose(handler: SharedHandler, middlewares: &[SharedMiddleware]) -> SharedHandler {
    middlewares.iter().rev().fold(handler, |inner, middleware| {
        Arc::new(Layer {
            middleware: Arc::clone(middleware),
            inner,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::from_fn as handler_fn;
    use crate::handler::test_support::{body_string, ctx};
    use crate::http::response;
    use hyper::StatusCode;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    type Trace = Arc<Mutex<Vec<String>>>;

    fn tracing_layer(name: &'static str, trace: &Trace) -> SharedMiddleware {
        let trace = Arc::clone(trace);
        from_fn(move |ctx, next: Next| {
            let trace = Arc::clone(&trace);
            async move {
                trace.lock().unwrap().push(format!("{name} before"));
                let result = next.run(ctx).await;
                trace.lock().unwrap().push(format!("{name} after"));
                result
            }
        })
    }

    #[tokio::test]
    async fn test_outermost_first() {
        let trace: Trace = Arc::default();
        let inner_trace = Arc::clone(&trace);
        let handler = handler_fn(move |_| {
            let trace = Arc::clone(&inner_trace);
            async move {
                trace.lock().unwrap().push("handler".to_string());
                Ok(response::text(StatusCode::OK, "done"))
            }
        });

        let composed = compose(
            handler,
            &[tracing_layer("a", &trace), tracing_layer("b", &trace)],
        );
        composed.call(ctx("GET", "/")).await.unwrap();

        assert_eq!(
            *trace.lock().unwrap(),
            ["a before", "b before", "handler", "b after", "a after"]
        );
    }

    #[tokio::test]
    async fn test_short_circuit_skips_inner_layers() {
        let reached = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&reached);
        let handler = handler_fn(move |_| {
            flag.store(true, Ordering::SeqCst);
            async { Ok(response::text(StatusCode::OK, "handler")) }
        });
        let deny = from_fn(|_, _next: Next| async {
            Ok(response::text(StatusCode::FORBIDDEN, "denied"))
        });

        let response = compose(handler, &[deny]).call(ctx("GET", "/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_string(response).await, "denied");
        assert!(!reached.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_post_processing() {
        let handler = handler_fn(|_| async { Ok(response::text(StatusCode::OK, "body")) });
        let tag = from_fn(|ctx, next: Next| async move {
            let mut response = next.run(ctx).await?;
            response
                .headers_mut()
                .insert("x-layer", hyper::header::HeaderValue::from_static("tagged"));
            Ok(response)
        });

        let response = compose(handler, &[tag]).call(ctx("GET", "/")).await.unwrap();
        assert_eq!(response.headers()["x-layer"], "tagged");
    }

    #[tokio::test]
    async fn test_empty_chain_is_the_handler() {
        let handler = handler_fn(|_| async { Ok(response::text(StatusCode::OK, "plain")) });
        let response = compose(handler, &[]).call(ctx("GET", "/")).await.unwrap();
        assert_eq!(body_string(response).await, "plain");
    }
}
