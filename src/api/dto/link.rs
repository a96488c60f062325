//! DTOs for link generation and link details endpoints.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::LazyLock;
use validator::Validate;

use crate::application::services::LinkDraft;
use crate::domain::entities::{EventSummary, LinkRecord, UtmParams};

/// Compiled regex for template id validation.
static TEMPLATE_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,128}$").unwrap());

/// Compiled regex for custom code validation.
static CUSTOM_CODE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z0-9-]+$").unwrap());

/// Request to generate a shareable link for a template.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLinkRequest {
    #[validate(regex(path = *TEMPLATE_ID_REGEX, message = "Invalid template id"))]
    pub template_id: String,

    /// Optional custom short code (validated for length and characters).
    #[validate(length(min = 4, max = 50))]
    #[validate(regex(path = *CUSTOM_CODE_REGEX))]
    pub custom_code: Option<String>,

    /// After this time the link redirects to the expired page.
    pub expires_at: Option<DateTime<Utc>>,

    #[validate(nested)]
    pub utm: Option<UtmInput>,

    /// Opaque state passed through to the editor.
    #[serde(default)]
    pub editor_context: Map<String, Value>,
}

/// UTM attribution supplied at link creation; omitted values use defaults.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UtmInput {
    #[validate(length(max = 100))]
    pub source: Option<String>,
    #[validate(length(max = 100))]
    pub medium: Option<String>,
    #[validate(length(max = 100))]
    pub campaign: Option<String>,
    #[validate(length(max = 100))]
    pub term: Option<String>,
    #[validate(length(max = 100))]
    pub content: Option<String>,
}

impl From<UtmInput> for UtmParams {
    fn from(input: UtmInput) -> Self {
        let defaults = UtmParams::default();
        UtmParams {
            source: input.source.unwrap_or(defaults.source),
            medium: input.medium.unwrap_or(defaults.medium),
            campaign: input.campaign,
            term: input.term,
            content: input.content,
        }
    }
}

impl From<CreateLinkRequest> for LinkDraft {
    fn from(request: CreateLinkRequest) -> Self {
        LinkDraft {
            template_id: request.template_id,
            custom_code: request.custom_code,
            expires_at: request.expires_at,
            utm: request.utm.map(UtmParams::from).unwrap_or_default(),
            editor_context: request.editor_context,
        }
    }
}

/// Link representation returned by the API.
#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub id: String,
    pub short_code: String,
    pub short_url: String,
    pub template_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub clicks: i64,
    pub last_clicked_at: Option<DateTime<Utc>>,
    pub utm: UtmParams,
    pub editor_context: Map<String, Value>,
}

impl LinkResponse {
    pub fn new(record: LinkRecord, short_url: String) -> Self {
        Self {
            id: record.id,
            short_code: record.short_code,
            short_url,
            template_id: record.template_id,
            created_at: record.created_at,
            expires_at: record.expires_at,
            clicks: record.clicks,
            last_clicked_at: record.last_clicked_at,
            utm: record.utm,
            editor_context: record.editor_context,
        }
    }
}

/// Link representation with recorded event counts.
#[derive(Debug, Serialize)]
pub struct LinkDetailsResponse {
    #[serde(flatten)]
    pub link: LinkResponse,
    pub events: EventSummary,
}
