//! Tower and axum middleware for the redirect and API routes.
//!
//! - [`auth`] - Bearer session check for `/api`
//! - [`rate_limit`] - Per-IP token buckets
//! - [`tracing`] - Request spans and latency logging

pub mod auth;
pub mod rate_limit;
pub mod tracing;
