//! Repository trait definitions for the domain layer.
//!
//! These traits abstract the external collaborators of link resolution:
//! the link store, the analytics sink and the session store. They are
//! implemented in `crate::infrastructure::persistence`.
//!
//! # Available Repositories
//!
//! - [`LinkRepository`] - Link lookup, creation and atomic click counting
//! - [`AnalyticsSink`] - Append-only analytics event recording
//! - [`SessionRepository`] - Session lookup for request authentication
//!
//! # Testing
//!
//! Mock implementations are generated via `mockall` for unit tests. See
//! `tests/repository_*.rs` for PostgreSQL integration tests.

pub mod analytics_sink;
pub mod link_repository;
pub mod session_repository;

pub use analytics_sink::AnalyticsSink;
pub use link_repository::LinkRepository;
pub use session_repository::SessionRepository;

#[cfg(test)]
pub use analytics_sink::MockAnalyticsSink;
#[cfg(test)]
pub use link_repository::MockLinkRepository;
#[cfg(test)]
pub use session_repository::MockSessionRepository;
