//! # MonoTask Shared Library
//!
//! Domain types and business logic behind the MonoTask API server.
//!
//! ## Module Organization
//!
//! - `models`: Users, tasks and subtasks with their queries and JSON views
//! - `status`: Task status derivation from subtask completion
//! - `repository`: Validated task and subtask operations
//! - `accounts`: Registration, login and avatar updates
//! - `auth`: Password hashing and bearer tokens
//! - `store`: Persistence traits with PostgreSQL and in-memory backends
//! - `db`: Connection pool and migrations
//! - `seed`: Demo data for local development

pub mod accounts;
pub mod auth;
pub mod db;
pub mod models;
pub mod repository;
pub mod seed;
pub mod status;
pub mod store;
pub mod validation;

/// Current version of the MonoTask shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
