//! Request handlers
//!
//! A handler turns a [`RequestContext`] into a response future. Closures of the form
//! `Fn(RequestContext) -> impl Future<Output = HandlerResult>` are handlers, so most
//! routes are declared inline.

pub mod static_files;

use crate::error::HandlerError;
use crate::http::{HttpRequest, HttpResponse, Method};
use crate::routing::Params;
use hyper::body::Bytes;
use hyper::HeaderMap;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;

/// Owned, sendable future returned by handlers and middleware
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Outcome of a handler; `Err` means an uncaught business failure (500)
pub type HandlerResult = Result<HttpResponse, HandlerError>;

/// Something that can answer a request
pub trait Handler: Send + Sync + 'static {
    fn call(&self, ctx: RequestContext) -> BoxFuture<HandlerResult>;
}

impl<F, Fut> Handler for F
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    fn call(&self, ctx: RequestContext) -> BoxFuture<HandlerResult> {
        Box::pin(self(ctx))
    }
}

/// Handlers are built once at startup and shared by every request
pub type SharedHandler = Arc<dyn Handler>;

/// Wrap an async closure as a shared handler
pub fn from_fn<F, Fut>(f: F) -> SharedHandler
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(f)
}

/// Request context handed to middleware and handlers
///
/// Carries the buffered request, the parameters captured by the matched route and the
/// peer address.
#[derive(Debug)]
pub struct RequestContext {
    request: HttpRequest,
    params: Params,
    remote_addr: Option<SocketAddr>,
}

impl RequestContext {
    pub fn new(request: HttpRequest) -> Self {
        Self {
            request,
            params: Params::new(),
            remote_addr: None,
        }
    }

    #[must_use]
    pub fn with_remote_addr(mut self, addr: Option<SocketAddr>) -> Self {
        self.remote_addr = addr;
        self
    }

    pub fn method(&self) -> &hyper::Method {
        self.request.method()
    }

    /// The method mapped onto the supported set, `None` if unsupported
    pub fn route_method(&self) -> Option<Method> {
        Method::from_http(self.request.method())
    }

    pub fn path(&self) -> &str {
        self.request.uri().path()
    }

    pub fn query(&self) -> Option<&str> {
        self.request.uri().query()
    }

    pub fn version(&self) -> hyper::Version {
        self.request.version()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.request.headers()
    }

    /// Header value as text; non-ASCII values are treated as absent
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request.headers().get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &Bytes {
        self.request.body()
    }

    pub const fn params(&self) -> &Params {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    pub(crate) fn set_params(&mut self, params: Params) {
        self.params = params;
    }

    pub const fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use http_body_util::BodyExt;

    pub fn request(method: &str, path: &str) -> HttpRequest {
        hyper::Request::builder()
            .method(method)
            .uri(path)
            .body(Bytes::new())
            .unwrap()
    }

    pub fn ctx(method: &str, path: &str) -> RequestContext {
        RequestContext::new(request(method, path))
    }

    pub async fn body_string(response: HttpResponse) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }
}
