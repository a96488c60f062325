//! Infrastructure layer for external integrations.
//!
//! Implements the collaborator traits declared in [`crate::domain::repositories`]
//! and the redirect-path cache.
//!
//! # Modules
//!
//! - [`cache`] - Caching abstractions (Redis and no-op implementations)
//! - [`persistence`] - PostgreSQL and in-memory repository implementations

pub mod cache;
pub mod persistence;
