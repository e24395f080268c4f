//! Request deadline enforcement
//!
//! The rest of the chain runs on its own task and races a timer. When the timer wins
//! the caller gets a 504 immediately; the inner task is detached, not aborted. Its
//! side effects still happen and its eventual response is dropped.

use super::{Middleware, Next};
use crate::handler::{BoxFuture, HandlerResult, RequestContext};
use crate::http::response;
use crate::logger;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct Timeout {
    deadline: Duration,
}

impl Timeout {
    pub const fn new(deadline: Duration) -> Self {
        Self { deadline }
    }

    pub const fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    pub const fn deadline(&self) -> Duration {
        self.deadline
    }
}

impl Middleware for Timeout {
    fn handle(&self, ctx: RequestContext, next: Next) -> BoxFuture<HandlerResult> {
        let deadline = self.deadline;
        Box::pin(async move {
            let request_line = format!("{} {}", ctx.method(), ctx.path());
            let task = tokio::spawn(next.run(ctx));

            match tokio::time::timeout(deadline, task).await {
                Ok(joined) => joined?,
                Err(_) => {
                    logger::log_warning(&format!(
                        "{request_line} exceeded {}ms deadline, responding 504",
                        deadline.as_millis()
                    ));
                    Ok(response::gateway_timeout())
                }
            }
        })
    }
}
