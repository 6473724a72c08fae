//! # TaskForge Shared Library
//!
//! Shared types and business logic used by the TaskForge API server.
//!
//! ## Module Organization
//!
//! - `models`: database models (users, tasks)
//! - `auth`: authentication and authorization (passwords, tokens, guard,
//!   ownership rules)
//! - `db`: connection pool and migrations

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the TaskForge shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
