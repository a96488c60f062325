//! Analytics events emitted by link resolution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What happened when a link was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Click,
    View,
    Edit,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::View => "view",
            EventKind::Edit => "edit",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "click" => Ok(EventKind::Click),
            "view" => Ok(EventKind::View),
            "edit" => Ok(EventKind::Edit),
            other => Err(format!("unknown event kind: {other}")),
        }
    }
}

/// A single analytics record produced by the resolver.
///
/// Events are handed to the background worker, which applies the click
/// counter update and forwards them to the analytics sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub kind: EventKind,
    pub link_id: String,
    pub template_id: String,
    pub user_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AnalyticsEvent {
    pub fn new(
        kind: EventKind,
        link_id: impl Into<String>,
        template_id: impl Into<String>,
        user_id: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            link_id: link_id.into(),
            template_id: template_id.into(),
            user_id,
            timestamp,
        }
    }

    /// Returns true if the caller must bump the link's click counter for this event.
    pub fn is_click(&self) -> bool {
        self.kind == EventKind::Click
    }
}

/// Recorded event counts for one link.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EventSummary {
    pub clicks: i64,
    pub views: i64,
    pub edits: i64,
}

impl EventSummary {
    /// Adds one event of `kind` to the summary.
    pub fn add(&mut self, kind: EventKind) {
        match kind {
            EventKind::Click => self.clicks += 1,
            EventKind::View => self.views += 1,
            EventKind::Edit => self.edits += 1,
        }
    }
}
