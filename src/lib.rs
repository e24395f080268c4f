//! Routing and middleware core of a small CMS backend
//!
//! Requests flow through a fixed pipeline:
//!
//! ```text
//! connection → [logging → timeout] → route table → [per-route auth] → handler
//! ```
//!
//! Route patterns use `/literal/:param/*wildcard` syntax and are matched in
//! declaration order. Every per-request failure becomes a response; only
//! configuration and route-table errors stop the process.

pub mod articles;
pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod middleware;
pub mod routes;
pub mod routing;
pub mod server;
