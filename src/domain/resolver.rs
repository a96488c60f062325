//! Redirect resolution for newsletter links.
//!
//! [`RedirectResolver::resolve`] is a pure decision function: it maps a looked-up
//! link (or its absence), the visitor's [`RequestContext`] and request UTM
//! overrides to a redirect URL plus the analytics events the caller must
//! forward. It performs no I/O and holds no mutable state, so a single instance
//! is shared by every request.
//!
//! # Outcomes
//!
//! | Condition                                   | Destination     | Events          |
//! |---------------------------------------------|-----------------|-----------------|
//! | no record                                   | `NotFound`      | none            |
//! | `expires_at < now`                          | `Expired`       | none            |
//! | editor-eligible, authenticated              | `Editor`        | `click`, `edit` |
//! | editor-eligible, not authenticated          | `AuthRequired`  | `click`, `edit` |
//! | otherwise                                   | `Preview`       | `click`, `view` |
//!
//! Editor eligibility is a paid subscription tier or the `force_editor_mode`
//! override. Unauthenticated visitors never receive the editor URL directly;
//! it is only carried, encoded, in the `callbackUrl` of the auth redirect.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use url::form_urlencoded;

use crate::domain::context::{RequestContext, UtmOverrides};
use crate::domain::entities::link::non_blank;
use crate::domain::entities::{
    AnalyticsEvent, DEFAULT_UTM_MEDIUM, DEFAULT_UTM_SOURCE, EventKind, LinkRecord, UtmParams,
};

/// Paths and defaults the resolver composes redirect URLs from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Prefixed to every redirect URL when set (e.g. `https://app.example.com`).
    pub base_url: Option<String>,
    pub home_path: String,
    pub expired_path: String,
    pub auth_path: String,
    pub editor_path: String,
    pub preview_path: String,
    pub default_campaign: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            home_path: "/".to_string(),
            expired_path: "/link-expired".to_string(),
            auth_path: "/auth".to_string(),
            editor_path: "/editor".to_string(),
            preview_path: "/template-library".to_string(),
            default_campaign: "weekly".to_string(),
        }
    }
}

/// Where a resolution sends the visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    Editor,
    Preview,
    Expired,
    NotFound,
    /// Editor-eligible but unauthenticated; redirected to sign in first.
    AuthRequired,
}

impl Destination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Destination::Editor => "editor",
            Destination::Preview => "preview",
            Destination::Expired => "expired",
            Destination::NotFound => "not_found",
            Destination::AuthRequired => "auth_required",
        }
    }
}

/// Output of a single resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionResult {
    pub redirect_url: String,
    pub events: Vec<AnalyticsEvent>,
    pub destination: Destination,
}

impl ResolutionResult {
    /// Number of `click` events, i.e. how many counter increments the caller owes.
    pub fn click_count(&self) -> usize {
        self.events.iter().filter(|e| e.is_click()).count()
    }
}

/// Stateless link resolver; see the module docs for the decision table.
#[derive(Debug, Clone, Default)]
pub struct RedirectResolver {
    config: ResolverConfig,
}

impl RedirectResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// Resolves a link for one request. Never fails.
    pub fn resolve(
        &self,
        record: Option<&LinkRecord>,
        ctx: &RequestContext,
        overrides: &UtmOverrides,
        now: DateTime<Utc>,
    ) -> ResolutionResult {
        let Some(record) = record else {
            return self.terminal(Destination::NotFound, &self.config.home_path);
        };

        if record.is_expired_at(now) {
            return self.terminal(Destination::Expired, &self.config.expired_path);
        }

        if !ctx.is_editor_eligible() {
            return ResolutionResult {
                redirect_url: self.absolute(&self.preview_url(record, overrides)),
                events: tracked_events(record, ctx, EventKind::View, now),
                destination: Destination::Preview,
            };
        }

        let editor_url = self.editor_url(record, overrides);
        let events = tracked_events(record, ctx, EventKind::Edit, now);

        if ctx.has_editor_access() {
            ResolutionResult {
                redirect_url: self.absolute(&editor_url),
                events,
                destination: Destination::Editor,
            }
        } else {
            let query = form_urlencoded::Serializer::new(String::new())
                .append_pair("callbackUrl", &editor_url)
                .finish();

            ResolutionResult {
                redirect_url: self.absolute(&format!("{}?{}", self.config.auth_path, query)),
                events,
                destination: Destination::AuthRequired,
            }
        }
    }

    fn terminal(&self, destination: Destination, path: &str) -> ResolutionResult {
        ResolutionResult {
            redirect_url: self.absolute(path),
            events: Vec::new(),
            destination,
        }
    }

    /// Relative editor URL: `{editor_path}?id={template}&utm_…[&context=…]`.
    fn editor_url(&self, record: &LinkRecord, overrides: &UtmOverrides) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("id", &record.template_id);
        self.append_tracking(&mut query, record, overrides);

        format!("{}?{}", self.config.editor_path, query.finish())
    }

    /// Relative preview URL: `{preview_path}/{template}?utm_…[&context=…]`.
    fn preview_url(&self, record: &LinkRecord, overrides: &UtmOverrides) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        self.append_tracking(&mut query, record, overrides);

        format!(
            "{}/{}?{}",
            self.config.preview_path.trim_end_matches('/'),
            encode_path_segment(&record.template_id),
            query.finish()
        )
    }

    fn append_tracking(
        &self,
        query: &mut form_urlencoded::Serializer<'_, String>,
        record: &LinkRecord,
        overrides: &UtmOverrides,
    ) {
        for (key, value) in compose_utm(&record.utm, overrides, &self.config.default_campaign) {
            query.append_pair(key, &value);
        }

        if !record.editor_context.is_empty() {
            let context = Value::Object(record.editor_context.clone()).to_string();
            query.append_pair("context", &context);
        }
    }

    fn absolute(&self, path: &str) -> String {
        match &self.config.base_url {
            Some(base) => format!("{}{}", base.trim_end_matches('/'), path),
            None => path.to_string(),
        }
    }
}

/// UTM query pairs in their fixed order: source, medium, campaign, term, content.
///
/// Override values win over the link's own; `term` and `content` are only
/// emitted when one of the two provides them. Blank values count as absent,
/// so `source` and `medium` fall back to their defaults.
pub fn compose_utm(
    utm: &UtmParams,
    overrides: &UtmOverrides,
    default_campaign: &str,
) -> Vec<(&'static str, String)> {
    let pick = |over: &Option<String>, own: Option<&String>| {
        non_blank(over.clone()).or_else(|| non_blank(own.cloned()))
    };

    let mut pairs = vec![
        (
            "utm_source",
            pick(&overrides.source, Some(&utm.source))
                .unwrap_or_else(|| DEFAULT_UTM_SOURCE.to_string()),
        ),
        (
            "utm_medium",
            pick(&overrides.medium, Some(&utm.medium))
                .unwrap_or_else(|| DEFAULT_UTM_MEDIUM.to_string()),
        ),
        (
            "utm_campaign",
            pick(&overrides.campaign, utm.campaign.as_ref())
                .unwrap_or_else(|| default_campaign.to_string()),
        ),
    ];

    if let Some(term) = pick(&overrides.term, utm.term.as_ref()) {
        pairs.push(("utm_term", term));
    }
    if let Some(content) = pick(&overrides.content, utm.content.as_ref()) {
        pairs.push(("utm_content", content));
    }

    pairs
}

fn tracked_events(
    record: &LinkRecord,
    ctx: &RequestContext,
    kind: EventKind,
    now: DateTime<Utc>,
) -> Vec<AnalyticsEvent> {
    [EventKind::Click, kind]
        .into_iter()
        .map(|kind| {
            AnalyticsEvent::new(
                kind,
                record.id.as_str(),
                record.template_id.as_str(),
                ctx.user_id.clone(),
                now,
            )
        })
        .collect()
}

// form-urlencoding only turns spaces into '+'; a literal '+' is already %2B.
fn encode_path_segment(segment: &str) -> String {
    form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
