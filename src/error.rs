//! Error types
//!
//! Startup errors (`PatternError`, `RouteError`, `ConfigError`, `ServerError`) abort the
//! process. `HandlerError` is per-request and always ends up as a response.

use thiserror::Error;

/// A route pattern that cannot be compiled
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("route pattern is empty")]
    Empty,
    #[error("wildcard `*{name}` must be the last segment of `{pattern}`")]
    WildcardNotLast { pattern: String, name: String },
    #[error("segment {index} of `{pattern}` is empty")]
    EmptySegment { pattern: String, index: usize },
    #[error("segment {index} of `{pattern}` has no capture name")]
    UnnamedCapture { pattern: String, index: usize },
    #[error("capture `{name}` appears more than once in `{pattern}`")]
    DuplicateCapture { pattern: String, name: String },
}

/// Route table construction failure
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("invalid route pattern: {0}")]
    Pattern(#[from] PatternError),
    #[error("route `{pattern}` has no method handlers and no fallback")]
    NoHandlers { pattern: String },
}

/// Configuration load or validation failure
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),
    #[error("no basic auth credentials configured; set BASIC_AUTH_USERNAME and BASIC_AUTH_PASSWORD")]
    MissingCredentials,
    #[error("invalid value for `{key}`: {reason}")]
    InvalidValue {
        key: &'static str,
        reason: &'static str,
    },
    #[error("invalid listen address `{addr}`: {source}")]
    InvalidAddress {
        addr: String,
        source: std::net::AddrParseError,
    },
    #[error("failed to read asset `{path}`: {source}")]
    Asset {
        path: String,
        source: std::io::Error,
    },
}

/// Uncaught failure from business logic
///
/// The client only ever sees a generic 500; the detail goes to the error log.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to build response: {0}")]
    Http(#[from] hyper::http::Error),
    #[error("handler panicked: {0}")]
    Panicked(String),
    #[error("handler task was cancelled")]
    Cancelled,
    #[error("{0}")]
    Internal(String),
}

impl HandlerError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl From<tokio::task::JoinError> for HandlerError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_panic() {
            let payload = err.into_panic();
            let message = payload
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            Self::Panicked(message)
        } else {
            Self::Cancelled
        }
    }
}

/// Fatal startup error
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Route(#[from] RouteError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_join_error_panic_message() {
        let handle = tokio::spawn(async {
            panic!("boom");
        });
        let err = HandlerError::from(handle.await.unwrap_err());
        match err {
            HandlerError::Panicked(msg) => assert_eq!(msg, "boom"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_pattern_error_display() {
        let err = PatternError::WildcardNotLast {
            pattern: "/a/*rest/b".to_string(),
            name: "rest".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "wildcard `*rest` must be the last segment of `/a/*rest/b`"
        );
    }
}
