//! User sessions and subscription tiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Subscription plan of a signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTier {
    Free,
    Starter,
    Pro,
    Business,
    Premium,
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Starter => "starter",
            SubscriptionTier::Pro => "pro",
            SubscriptionTier::Business => "business",
            SubscriptionTier::Premium => "premium",
        }
    }

    /// Parses a stored tier name, case-insensitively.
    ///
    /// Unknown names yield `None`, which callers treat the same as having no tier.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "free" => Some(SubscriptionTier::Free),
            "starter" => Some(SubscriptionTier::Starter),
            "pro" => Some(SubscriptionTier::Pro),
            "business" => Some(SubscriptionTier::Business),
            "premium" => Some(SubscriptionTier::Premium),
            _ => None,
        }
    }

    /// Returns true for paid tiers, which may open templates in the editor.
    pub fn grants_editor(&self) -> bool {
        !matches!(self, SubscriptionTier::Free)
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated user session.
///
/// Only the HMAC of the raw session token is ever stored.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: i64,
    pub user_id: String,
    pub subscription_tier: Option<SubscriptionTier>,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Returns true if the session can still authenticate requests at `now`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at.is_none_or(|expires_at| expires_at > now)
    }
}

/// Input data for issuing a new session.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: String,
    pub subscription_tier: Option<SubscriptionTier>,
    pub token_hash: String,
    pub expires_at: Option<DateTime<Utc>>,
}
