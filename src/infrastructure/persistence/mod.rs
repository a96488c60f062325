//! Repository implementations.
//!
//! PostgreSQL implementations use SQLx runtime queries mapped through
//! `FromRow` rows; in-memory implementations back local runs and tests.
//!
//! # Repositories
//!
//! - [`PgLinkRepository`] / [`MemoryLinkRepository`] - Link storage and click counting
//! - [`PgAnalyticsSink`] / [`MemoryAnalyticsSink`] - Analytics event recording
//! - [`PgSessionRepository`] / [`MemorySessionRepository`] - Session lookup

pub mod memory;
pub mod pg_analytics_sink;
pub mod pg_link_repository;
pub mod pg_session_repository;

pub use memory::{MemoryAnalyticsSink, MemoryLinkRepository, MemorySessionRepository};
pub use pg_analytics_sink::PgAnalyticsSink;
pub use pg_link_repository::PgLinkRepository;
pub use pg_session_repository::PgSessionRepository;
