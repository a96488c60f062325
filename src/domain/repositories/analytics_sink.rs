//! Append-only analytics event recorder.

use crate::domain::entities::{AnalyticsEvent, EventSummary};
use crate::error::AppError;
use async_trait::async_trait;

/// Destination for analytics events produced by link resolution.
///
/// Delivery is at-least-once: the event worker may retry a `record` call that
/// actually succeeded, so implementations must tolerate duplicates.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgAnalyticsSink`] - PostgreSQL `link_events` table
/// - [`crate::infrastructure::persistence::MemoryAnalyticsSink`] - In-process buffer
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    /// Appends one event.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn record(&self, event: AnalyticsEvent) -> Result<(), AppError>;

    /// Counts recorded events for a link by kind.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn summarize(&self, link_id: &str) -> Result<EventSummary, AppError>;

    /// Checks whether the sink backend is reachable.
    async fn health_check(&self) -> bool;
}
