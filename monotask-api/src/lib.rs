//! # MonoTask API Server Library
//!
//! HTTP surface of the MonoTask task tracker: authentication, tasks and
//! subtasks, served with Axum over the stores in `monotask-shared`.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Route access table and authentication gate
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
