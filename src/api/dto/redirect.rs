//! Query parameters accepted on the redirect endpoint.

use serde::Deserialize;

use crate::domain::context::UtmOverrides;

/// Recognized query parameters of `GET /l/{code}`.
///
/// Unknown parameters (including the legacy `delay`) are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct RedirectQuery {
    pub to_editor: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
}

impl RedirectQuery {
    /// `to_editor=1` or `to_editor=true` (case-insensitive).
    pub fn force_editor_mode(&self) -> bool {
        self.to_editor
            .as_deref()
            .map(str::trim)
            .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
    }

    pub fn utm_overrides(&self) -> UtmOverrides {
        UtmOverrides {
            source: self.utm_source.clone(),
            medium: self.utm_medium.clone(),
            campaign: self.utm_campaign.clone(),
            term: self.utm_term.clone(),
            content: self.utm_content.clone(),
        }
        .normalized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(to_editor: Option<&str>) -> RedirectQuery {
        RedirectQuery {
            to_editor: to_editor.map(str::to_string),
            ..RedirectQuery::default()
        }
    }

    #[test]
    fn test_force_editor_mode_values() {
        assert!(query(Some("1")).force_editor_mode());
        assert!(query(Some("true")).force_editor_mode());
        assert!(query(Some("TRUE")).force_editor_mode());
        assert!(!query(Some("0")).force_editor_mode());
        assert!(!query(Some("yes")).force_editor_mode());
        assert!(!query(None).force_editor_mode());
    }

    #[test]
    fn test_blank_overrides_are_dropped() {
        let q = RedirectQuery {
            utm_campaign: Some("  ".to_string()),
            utm_source: Some("partner".to_string()),
            ..RedirectQuery::default()
        };

        let overrides = q.utm_overrides();
        assert_eq!(overrides.source.as_deref(), Some("partner"));
        assert_eq!(overrides.campaign, None);
    }
}
