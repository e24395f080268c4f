//! Routing module
//!
//! - `pattern`: compiles `/literal/:param/*wildcard` templates and matches paths
//! - `table`: ordered route entries with per-method dispatch
//!
//! Tables are built once at startup and never mutated, so they are shared across
//! connections without locking.

mod pattern;
mod table;

pub use pattern::{Params, RoutePattern, Segment};
pub use table::{
    any, delete, get, patch, post, put, Endpoint, MethodRouter, Resolution, RouteEntry,
    RouteMatch, RouteTable, RouteTableBuilder,
};
