//! Newsletter link entity and its tracking attributes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::{DefaultOnNull, serde_as};

/// Default `utm_source` for links that do not carry one.
pub const DEFAULT_UTM_SOURCE: &str = "newsletter";

/// Default `utm_medium` for links that do not carry one.
pub const DEFAULT_UTM_MEDIUM: &str = "email";

/// UTM attribution attached to a link.
///
/// `source` and `medium` are always present after normalization; the remaining
/// parameters are optional and omitted from redirect URLs when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UtmParams {
    pub source: String,
    pub medium: String,
    pub campaign: Option<String>,
    pub term: Option<String>,
    pub content: Option<String>,
}

impl Default for UtmParams {
    fn default() -> Self {
        Self {
            source: DEFAULT_UTM_SOURCE.to_string(),
            medium: DEFAULT_UTM_MEDIUM.to_string(),
            campaign: None,
            term: None,
            content: None,
        }
    }
}

impl UtmParams {
    /// Replaces blank values with their defaults (`source`, `medium`) or `None`.
    pub fn normalized(self) -> Self {
        Self {
            source: non_blank(Some(self.source)).unwrap_or_else(|| DEFAULT_UTM_SOURCE.to_string()),
            medium: non_blank(Some(self.medium)).unwrap_or_else(|| DEFAULT_UTM_MEDIUM.to_string()),
            campaign: non_blank(self.campaign),
            term: non_blank(self.term),
            content: non_blank(self.content),
        }
    }
}

/// Trims a value and drops it when nothing is left.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// A previously generated shareable newsletter link.
///
/// Records reach the resolver only through a store, and every store passes
/// them through [`LinkRecord::normalized`] first. Deserialization accepts
/// missing or `null` optional fields so cached and legacy documents decode.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub id: String,
    pub short_code: String,
    pub template_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub clicks: i64,
    #[serde(default)]
    pub last_clicked_at: Option<DateTime<Utc>>,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub utm: UtmParams,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub editor_context: Map<String, Value>,
}

impl LinkRecord {
    /// Returns true if the link's expiry is strictly before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < now)
    }

    /// Applies the defaulting rules every store boundary relies on.
    pub fn normalized(self) -> Self {
        Self {
            clicks: self.clicks.max(0),
            utm: self.utm.normalized(),
            ..self
        }
    }
}

/// Input data for creating a new link.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub id: String,
    pub short_code: String,
    pub template_id: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub utm: UtmParams,
    pub editor_context: Map<String, Value>,
}

impl NewLink {
    /// Materializes the record a store persists for this input.
    pub fn into_record(self, created_at: DateTime<Utc>) -> LinkRecord {
        LinkRecord {
            id: self.id,
            short_code: self.short_code,
            template_id: self.template_id,
            created_at,
            expires_at: self.expires_at,
            clicks: 0,
            last_clicked_at: None,
            utm: self.utm,
            editor_context: self.editor_context,
        }
        .normalized()
    }
}
