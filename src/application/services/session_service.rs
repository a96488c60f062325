//! Session authentication and request context construction.

use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::context::RequestContext;
use crate::domain::entities::{NewSession, Session, SubscriptionTier};
use crate::domain::repositories::SessionRepository;
use crate::error::AppError;
use crate::utils::session_token::generate_session_token;
use serde_json::json;

type HmacSha256 = Hmac<Sha256>;

/// Hashes a raw session token with HMAC-SHA256 keyed by `signing_secret`.
///
/// Returns a 64-character lowercase hex-encoded MAC.
pub fn hash_session_token(signing_secret: &str, token: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(signing_secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(token.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Service resolving session tokens into sessions and request contexts.
///
/// Tokens are hashed with HMAC-SHA256 (keyed by `signing_secret`) before storage
/// and comparison. An attacker with read-only access to the database cannot verify
/// or forge tokens without the server-side secret.
pub struct SessionService<R: SessionRepository + ?Sized> {
    repository: Arc<R>,
    signing_secret: String,
}

impl<R: SessionRepository + ?Sized> SessionService<R> {
    /// Creates a new session service.
    ///
    /// # Arguments
    ///
    /// - `repository` - session store
    /// - `signing_secret` - HMAC key; must match the value used when sessions were issued
    pub fn new(repository: Arc<R>, signing_secret: String) -> Self {
        Self {
            repository,
            signing_secret,
        }
    }

    fn hash_token(&self, token: &str) -> String {
        hash_session_token(&self.signing_secret, token)
    }

    /// Authenticates a raw token against active sessions.
    ///
    /// On success, updates `last_used_at` on a best-effort basis.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if no active session matches the token.
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn authenticate(&self, token: &str) -> Result<Session, AppError> {
        let token_hash = self.hash_token(token);
        let now = Utc::now();

        let session = self
            .repository
            .find_active(&token_hash, now)
            .await?
            .ok_or_else(|| {
                AppError::unauthorized(
                    "Unauthorized",
                    json!({"reason": "Invalid, expired or revoked session"}),
                )
            })?;

        if let Err(e) = self.repository.touch(&token_hash, now).await {
            debug!("Failed to update session last_used_at: {}", e);
        }

        Ok(session)
    }

    /// Builds the request context for an optional raw token.
    ///
    /// Never fails: a missing or rejected token, or a session store error,
    /// yields an anonymous context.
    pub async fn context_for(&self, token: Option<&str>) -> RequestContext {
        let Some(token) = token else {
            return RequestContext::anonymous();
        };

        match self.authenticate(token).await {
            Ok(session) => RequestContext::for_session(&session),
            Err(AppError::Unauthorized { .. }) => {
                debug!("Session token rejected, continuing anonymously");
                RequestContext::anonymous()
            }
            Err(e) => {
                warn!("Session lookup failed, continuing anonymously: {}", e);
                RequestContext::anonymous()
            }
        }
    }

    /// Issues a new session and returns it together with the raw token.
    ///
    /// The raw token is not stored and cannot be recovered later.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `user_id` is blank or `ttl_days` is not positive.
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn issue(
        &self,
        user_id: &str,
        subscription_tier: Option<SubscriptionTier>,
        ttl_days: Option<i64>,
    ) -> Result<(String, Session), AppError> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(AppError::bad_request(
                "User id must not be empty",
                json!({}),
            ));
        }

        let expires_at = match ttl_days {
            Some(days) if days <= 0 => {
                return Err(AppError::bad_request(
                    "Session TTL must be positive",
                    json!({ "ttl_days": days }),
                ));
            }
            Some(days) => Some(Utc::now() + Duration::days(days)),
            None => None,
        };

        let token = generate_session_token();
        let session = self
            .repository
            .create(NewSession {
                user_id: user_id.to_string(),
                subscription_tier,
                token_hash: self.hash_token(&token),
                expires_at,
            })
            .await?;

        Ok((token, session))
    }

    /// Lists all sessions, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn list(&self) -> Result<Vec<Session>, AppError> {
        self.repository.list().await
    }

    /// Revokes a session by id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the session does not exist or is already revoked.
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn revoke(&self, id: i64) -> Result<(), AppError> {
        if self.repository.revoke(id).await? {
            Ok(())
        } else {
            Err(AppError::not_found(
                "Session not found or already revoked",
                json!({ "id": id }),
            ))
        }
    }
}
