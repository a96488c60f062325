//! Repository trait for newsletter link storage (the link store).

use crate::domain::entities::{LinkRecord, NewLink};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository interface for newsletter links.
///
/// Implementations must return records already passed through
/// [`LinkRecord::normalized`], so callers never see partial data.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryLinkRepository`] - In-process store
/// - Test mocks available with `cfg(test)`
///
/// # Examples
///
/// See integration tests: `tests/repository_link.rs`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Creates a new link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the short code or id already exists.
    /// Returns [`AppError::Internal`] on storage errors.
    async fn create(&self, new_link: NewLink) -> Result<LinkRecord, AppError>;

    /// Looks up a link by its short code.
    ///
    /// Expired links are returned as well; expiry is evaluated at resolution time.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn find_by_short_code(&self, short_code: &str) -> Result<Option<LinkRecord>, AppError>;

    /// Atomically increments `clicks` by one and sets `last_clicked_at`.
    ///
    /// Must be safe under concurrent calls for the same link: N calls yield
    /// exactly N increments.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no link has this id.
    /// Returns [`AppError::Internal`] on storage errors. Such an error may
    /// arrive after the update committed, so callers must not retry it.
    async fn increment_clicks(&self, id: &str, clicked_at: DateTime<Utc>) -> Result<(), AppError>;

    /// Counts stored links.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn count(&self) -> Result<i64, AppError>;
}
