//! # Taskboard Shared Library
//!
//! Domain types, persistence and business rules for the Taskboard service.
//! The HTTP server in `taskboard-api` is a thin layer over [`services`].
//!
//! ## Module Organization
//!
//! - `slug`: opaque public identifiers
//! - `models`: database models and data structures
//! - `store`: persistence seam with PostgreSQL and in-memory implementations
//! - `db`: connection pool and migrations
//! - `auth`: tokens, passwords and board authority
//! - `visibility`: per-user visible sets and parent resolution
//! - `blob`: attachment payload storage
//! - `services`: resource lifecycle controllers
//! - `error`: service error taxonomy

pub mod auth;
pub mod blob;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod slug;
pub mod store;
pub mod visibility;

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
