// Request pipeline shared by every connection
// Route table lookup wrapped in the global middleware chain, plus the outermost
// failure boundary

use crate::error::HandlerError;
use crate::handler::{BoxFuture, Handler, HandlerResult, RequestContext, SharedHandler};
use crate::http::{response, HttpRequest, HttpResponse};
use crate::logger;
use crate::middleware::{compose, SharedMiddleware};
use crate::routing::{Resolution, RouteTable};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, SERVER};
use std::net::SocketAddr;
use std::sync::Arc;

/// Innermost layer: resolve the route and call its handler
struct Dispatcher {
    table: RouteTable,
    not_found: SharedHandler,
}

impl Handler for Dispatcher {
    fn call(&self, mut ctx: RequestContext) -> BoxFuture<HandlerResult> {
        match self.table.lookup(ctx.route_method(), ctx.path()) {
            Resolution::Matched(found) => {
                let handler = Arc::clone(found.handler);
                ctx.set_params(found.params);
                handler.call(ctx)
            }
            Resolution::MethodNotAllowed { allowed, .. } => {
                let allow = allowed.allow_header();
                Box::pin(async move { Ok(response::method_not_allowed(&allow)) })
            }
            Resolution::NotFound => self.not_found.call(ctx),
        }
    }
}

fn default_not_found() -> SharedHandler {
    crate::handler::from_fn(|_ctx: RequestContext| async { Ok(response::not_found()) })
}

/// The routed application
pub struct App {
    chain: SharedHandler,
    server_name: Option<HeaderValue>,
    routes: usize,
}

impl App {
    pub fn new(table: RouteTable) -> Self {
        let routes = table.len();
        Self {
            chain: Arc::new(Dispatcher {
                table,
                not_found: default_not_found(),
            }),
            server_name: None,
            routes,
        }
    }

    /// Wrap the dispatcher; `middlewares[0]` is outermost and sees 404/405 responses too
    #[must_use]
    pub fn with_middleware(mut self, middlewares: &[SharedMiddleware]) -> Self {
        self.chain = compose(self.chain, middlewares);
        self
    }

    /// Value for the `Server` response header
    #[must_use]
    pub fn with_server_name(mut self, name: &str) -> Self {
        self.server_name = HeaderValue::from_str(name).ok();
        self
    }

    pub const fn route_count(&self) -> usize {
        self.routes
    }

    /// Run one request through the chain; never fails
    ///
    /// The chain runs on its own task so that a panic is contained and answered
    /// with a 500 like any other handler error.
    pub async fn handle(&self, request: HttpRequest, remote_addr: Option<SocketAddr>) -> HttpResponse {
        let is_head = request.method() == hyper::Method::HEAD;
        let request_line = format!("{} {}", request.method(), request.uri().path());
        let ctx = RequestContext::new(request).with_remote_addr(remote_addr);

        let chain = Arc::clone(&self.chain);
        let outcome = match tokio::spawn(async move { chain.call(ctx).await }).await {
            Ok(result) => result,
            Err(join_error) => Err(HandlerError::from(join_error)),
        };

        let mut response = outcome.unwrap_or_else(|err| {
            logger::log_error(&format!("Problem serving {request_line}: {err}"));
            response::internal_error()
        });

        if is_head {
            // Content-Length stays, describing the body a GET would return
            *response.body_mut() = Full::new(Bytes::new());
        }
        if let Some(server_name) = &self.server_name {
            response.headers_mut().insert(SERVER, server_name.clone());
        }
        response
    }
}
