//! Per-request facts the resolver decides on.

use crate::domain::entities::link::non_blank;
use crate::domain::entities::{Session, SubscriptionTier};

/// Who is following a link and under which access rules.
///
/// Built fresh for every redirect request and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub is_authenticated: bool,
    pub subscription_tier: Option<SubscriptionTier>,
    /// Explicit request to land in the editor (the `to_editor` query flag).
    pub force_editor_mode: bool,
    pub user_id: Option<String>,
}

impl RequestContext {
    /// Context for a visitor without a valid session.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Context for a visitor holding an active session.
    pub fn for_session(session: &Session) -> Self {
        Self {
            is_authenticated: true,
            subscription_tier: session.subscription_tier,
            force_editor_mode: false,
            user_id: Some(session.user_id.clone()),
        }
    }

    pub fn with_force_editor_mode(mut self, force: bool) -> Self {
        self.force_editor_mode = force;
        self
    }

    /// Tier or override would open the editor, regardless of authentication.
    pub fn is_editor_eligible(&self) -> bool {
        self.force_editor_mode
            || self
                .subscription_tier
                .is_some_and(|tier| tier.grants_editor())
    }

    /// Authenticated and editor-eligible.
    pub fn has_editor_access(&self) -> bool {
        self.is_authenticated && self.is_editor_eligible()
    }
}

/// UTM values supplied on the request that take precedence over the link's own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtmOverrides {
    pub source: Option<String>,
    pub medium: Option<String>,
    pub campaign: Option<String>,
    pub term: Option<String>,
    pub content: Option<String>,
}

impl UtmOverrides {
    pub fn none() -> Self {
        Self::default()
    }

    /// Drops blank values so they never shadow the link's attributes.
    pub fn normalized(self) -> Self {
        Self {
            source: non_blank(self.source),
            medium: non_blank(self.medium),
            campaign: non_blank(self.campaign),
            term: non_blank(self.term),
            content: non_blank(self.content),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn session(tier: Option<SubscriptionTier>) -> Session {
        Session {
            id: 7,
            user_id: "user-7".to_string(),
            subscription_tier: tier,
            token_hash: "h".to_string(),
            created_at: Utc::now(),
            expires_at: None,
            revoked_at: None,
            last_used_at: None,
        }
    }

    #[test]
    fn test_anonymous_has_no_access() {
        let ctx = RequestContext::anonymous();
        assert!(!ctx.is_authenticated);
        assert!(!ctx.is_editor_eligible());
        assert!(!ctx.has_editor_access());
    }

    #[test]
    fn test_for_session_copies_user_and_tier() {
        let ctx = RequestContext::for_session(&session(Some(SubscriptionTier::Pro)));
        assert!(ctx.is_authenticated);
        assert_eq!(ctx.user_id.as_deref(), Some("user-7"));
        assert!(ctx.has_editor_access());
    }

    #[test]
    fn test_free_tier_needs_override() {
        let ctx = RequestContext::for_session(&session(Some(SubscriptionTier::Free)));
        assert!(!ctx.has_editor_access());
        assert!(ctx.with_force_editor_mode(true).has_editor_access());
    }

    #[test]
    fn test_override_without_auth_is_eligible_but_not_granted() {
        let ctx = RequestContext::anonymous().with_force_editor_mode(true);
        assert!(ctx.is_editor_eligible());
        assert!(!ctx.has_editor_access());
    }

    #[test]
    fn test_overrides_drop_blanks() {
        let overrides = UtmOverrides {
            source: Some("".to_string()),
            campaign: Some("summer".to_string()),
            ..UtmOverrides::none()
        }
        .normalized();

        assert!(overrides.source.is_none());
        assert_eq!(overrides.campaign.as_deref(), Some("summer"));
    }
}
