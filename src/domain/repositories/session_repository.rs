//! Repository trait for user sessions.

use crate::domain::entities::{NewSession, Session};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository interface for session lookup and management.
///
/// Sessions are keyed by the HMAC of their raw token; raw tokens never reach
/// the store.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgSessionRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemorySessionRepository`] - In-process store
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Finds a session that is neither revoked nor expired at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn find_active(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, AppError>;

    /// Updates the `last_used_at` timestamp for a session.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn touch(&self, token_hash: &str, at: DateTime<Utc>) -> Result<(), AppError>;

    /// Issues a new session.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the token hash is already in use.
    /// Returns [`AppError::Internal`] on storage errors.
    async fn create(&self, new_session: NewSession) -> Result<Session, AppError>;

    /// Lists all sessions, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn list(&self) -> Result<Vec<Session>, AppError>;

    /// Revokes a session by id.
    ///
    /// Returns `Ok(false)` when the session does not exist or is already revoked.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    async fn revoke(&self, id: i64) -> Result<bool, AppError>;
}
