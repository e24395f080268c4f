// Configuration module entry point
// Layered loading: defaults, optional file, CMS_* environment, deployment variables

mod types;

use crate::error::ConfigError;
use crate::logger::AccessLogFormat;
use crate::middleware::basic_auth::{Credentials, MAX_PASSWORD_LEN};
use ::config::{Environment, File};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub use types::{
    AssetsConfig, AuthConfig, Config, HttpConfig, LoggingConfig, ServerConfig, UserEntry,
};

/// Default config file, looked up with any supported extension
pub const DEFAULT_CONFIG_PATH: &str = "config";

impl Config {
    /// Load from `config_path` (optional) and the process environment
    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        Self::load_with(config_path, |key| std::env::var(key).ok())
    }

    /// Load with `env` supplying the deployment variables `PORT`,
    /// `BASIC_AUTH_USERNAME` and `BASIC_AUTH_PASSWORD`
    pub fn load_with(
        config_path: &str,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let settings = ::config::Config::builder()
            .add_source(File::with_name(config_path).required(false))
            .add_source(
                Environment::with_prefix("CMS")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("http.server_name", "cms-router")?
            .set_default("http.max_body_size", 1_048_576)? // 1MB
            .set_default("http.request_timeout_ms", 10_000)?
            .set_default("auth.realm", "Log in to the admin panel")?
            .set_default("assets.root", "frontend/public")?
            .set_default("assets.index_file", "index.html")?
            .set_override_option("server.port", env("PORT"))?
            .build()?;

        let mut config: Self = settings.try_deserialize()?;
        let non_empty = |key: &str| env(key).filter(|value| !value.is_empty());
        match (non_empty("BASIC_AUTH_USERNAME"), non_empty("BASIC_AUTH_PASSWORD")) {
            (Some(username), Some(password)) => {
                config.auth.users.retain(|user| user.username != username);
                config.auth.users.push(UserEntry { username, password });
            }
            (None, None) => {}
            // Only one of the pair is set
            _ => return Err(ConfigError::MissingCredentials),
        }
        Ok(config)
    }

    /// Startup checks that deserialization cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        let users = &self.auth.users;
        if users.is_empty()
            || users
                .iter()
                .any(|user| user.username.is_empty() || user.password.is_empty())
        {
            return Err(ConfigError::MissingCredentials);
        }
        if users
            .iter()
            .any(|user| user.password.len() > MAX_PASSWORD_LEN)
        {
            return Err(ConfigError::InvalidValue {
                key: "auth.users.password",
                reason: "longer than 256 bytes",
            });
        }
        if self.server.workers == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "server.workers",
                reason: "must be at least 1",
            });
        }
        if self.http.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "http.request_timeout_ms",
                reason: "must be greater than 0",
            });
        }
        self.socket_addr().map(|_| ())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .map_err(|source| ConfigError::InvalidAddress { addr, source })
    }

    /// The credential store handed to the auth gate
    pub fn credentials(&self) -> Credentials {
        self.auth
            .users
            .iter()
            .filter(|user| !user.username.is_empty() && !user.password.is_empty())
            .map(|user| (user.username.clone(), user.password.clone()))
            .collect()
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.http.request_timeout_ms)
    }

    pub fn access_log_format(&self) -> AccessLogFormat {
        self.logging
            .access_log_format
            .parse()
            .unwrap_or(AccessLogFormat::Combined)
    }

    pub fn asset_root(&self) -> PathBuf {
        PathBuf::from(&self.assets.root)
    }

    /// Path of the fallback document
    pub fn index_path(&self) -> PathBuf {
        self.asset_root().join(&self.assets.index_file)
    }
}
