//! rosetta-server: forum backend over PostgreSQL
//!
//! A generic repository engine (filtered keyset pagination, partial
//! updates, soft delete) instantiated for users, forums, threads and posts,
//! plus per-user votes on threads and posts. The HTTP layer is a thin axum
//! mapping onto [`db::Models`].

pub mod config;
pub mod db;
pub mod http;
pub mod models;

pub use config::{ConfigError, DatabaseConfig, RosettaConfig};
pub use db::{DbError, Models};
pub use http::{build_router, run_server, AppState, ServerConfig};
