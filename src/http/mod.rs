//! HTTP protocol layer
//!
//! Response builders, method enumeration, content types and cache validators shared by
//! the router, the middleware and the handlers.

pub mod cache;
pub mod method;
pub mod mime;
pub mod response;

use http_body_util::Full;
use hyper::body::Bytes;

pub use method::{Method, MethodSet};

/// Every response this crate produces
pub type HttpResponse = hyper::Response<Full<Bytes>>;

/// A request whose body has already been collected
pub type HttpRequest = hyper::Request<Bytes>;
