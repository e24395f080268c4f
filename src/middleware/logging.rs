//! Access logging middleware
//!
//! Records one entry per request after the inner chain settles. The result is handed
//! back untouched; an `Err` is logged as the 500 the server boundary will turn it into.

use super::{Middleware, Next};
use crate::handler::{BoxFuture, HandlerResult, RequestContext};
use crate::logger::{self, AccessLogEntry, AccessLogFormat};
use hyper::body::Body;
use hyper::header::{REFERER, USER_AGENT};
use hyper::{StatusCode, Version};
use std::sync::Arc;
use std::time::Instant;

/// Destination for finished entries
pub type AccessSink = Arc<dyn Fn(AccessLogEntry) + Send + Sync>;

pub struct AccessLog {
    sink: AccessSink,
}

impl AccessLog {
    /// Log through the global logger in `format`
    pub fn new(format: AccessLogFormat) -> Self {
        Self::with_sink(Arc::new(move |entry: AccessLogEntry| {
            logger::log_access(&entry, &format);
        }))
    }

    pub fn with_sink(sink: AccessSink) -> Self {
        Self { sink }
    }
}

const fn version_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

fn start_entry(ctx: &RequestContext) -> AccessLogEntry {
    let remote_addr = ctx
        .remote_addr()
        .map_or_else(|| "-".to_string(), |addr| addr.ip().to_string());
    let mut entry = AccessLogEntry::new(
        remote_addr,
        ctx.method().to_string(),
        ctx.path().to_string(),
    );
    entry.query = ctx.query().map(ToString::to_string);
    entry.http_version = version_str(ctx.version()).to_string();
    entry.referer = ctx.header(REFERER.as_str()).map(ToString::to_string);
    entry.user_agent = ctx.header(USER_AGENT.as_str()).map(ToString::to_string);
    entry
}

impl Middleware for AccessLog {
    fn handle(&self, ctx: RequestContext, next: Next) -> BoxFuture<HandlerResult> {
        let sink = Arc::clone(&self.sink);
        let mut entry = start_entry(&ctx);
        Box::pin(async move {
            let started = Instant::now();
            let result = next.run(ctx).await;

            entry.request_time_us =
                u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
            match &result {
                Ok(response) => {
                    entry.status = response.status().as_u16();
                    entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
                }
                Err(_) => entry.status = StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            }
            sink(entry);

            result
        })
    }
}
