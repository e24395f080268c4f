// Configuration types module
// Plain data loaded once at startup; see `Config::load_from`

use serde::Deserialize;
use std::fmt;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub http: HttpConfig,
    pub auth: AuthConfig,
    pub assets: AssetsConfig,
}

/// Listener configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Runtime worker threads, CPU count when unset
    #[serde(default)]
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    pub access_log_format: String,
    /// Access log file path (stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

/// HTTP behavior
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// Value of the `Server` response header
    pub server_name: String,
    /// Largest accepted request body, in bytes
    pub max_body_size: u64,
    /// Deadline for a single request before it is answered with 504
    pub request_timeout_ms: u64,
}

/// Basic auth settings
#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub realm: String,
    #[serde(default)]
    pub users: Vec<UserEntry>,
}

/// One `[[auth.users]]` entry
///
/// Stored as a list rather than a table: configuration keys are case-folded, usernames
/// must not be.
#[derive(Deserialize, Clone, PartialEq, Eq)]
pub struct UserEntry {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for UserEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserEntry")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Static frontend assets
#[derive(Debug, Deserialize, Clone)]
pub struct AssetsConfig {
    /// Directory served under `/admin/`
    pub root: String,
    /// App shell served for any unreadable path, relative to `root`
    pub index_file: String,
}
