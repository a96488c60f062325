//! Link generation and retrieval service.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};
use std::sync::Arc;

use crate::domain::entities::{EventSummary, LinkRecord, NewLink, UtmParams};
use crate::domain::repositories::{AnalyticsSink, LinkRepository};
use crate::error::AppError;
use crate::utils::code_generator::{
    RESERVED_CODES, generate_code, generate_link_id, validate_custom_code,
};

/// Everything a caller supplies to generate a link.
#[derive(Debug, Clone, Default)]
pub struct LinkDraft {
    pub template_id: String,
    pub custom_code: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub utm: UtmParams,
    pub editor_context: Map<String, Value>,
}

/// Service for creating shareable links and reading them back with analytics.
pub struct LinkService<L: LinkRepository + ?Sized, S: AnalyticsSink + ?Sized> {
    link_repository: Arc<L>,
    analytics_sink: Arc<S>,
    public_base_url: String,
}

impl<L: LinkRepository + ?Sized, S: AnalyticsSink + ?Sized> LinkService<L, S> {
    /// Creates a new link service.
    ///
    /// `public_base_url` is the origin short URLs are built on.
    pub fn new(link_repository: Arc<L>, analytics_sink: Arc<S>, public_base_url: String) -> Self {
        Self {
            link_repository,
            analytics_sink,
            public_base_url,
        }
    }

    /// Generates a link for a template.
    ///
    /// # Code Generation
    ///
    /// - If `custom_code` is provided, validates and uses it (or returns conflict error)
    /// - Otherwise, generates a random 12-character code
    /// - Retries up to 10 times on collision before failing
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the template id is blank, the custom code
    /// is invalid or reserved, or `expires_at` is not in the future.
    /// Returns [`AppError::Conflict`] if the custom code is taken.
    pub async fn create_link(&self, draft: LinkDraft) -> Result<LinkRecord, AppError> {
        let template_id = draft.template_id.trim().to_string();
        if template_id.is_empty() {
            return Err(AppError::bad_request(
                "Template id must not be empty",
                json!({}),
            ));
        }

        if let Some(expires_at) = draft.expires_at
            && expires_at <= Utc::now()
        {
            return Err(AppError::bad_request(
                "Expiry must be in the future",
                json!({ "expires_at": expires_at }),
            ));
        }

        let short_code = match draft.custom_code {
            Some(custom) => {
                validate_custom_code(&custom)?;

                if self
                    .link_repository
                    .find_by_short_code(&custom)
                    .await?
                    .is_some()
                {
                    return Err(AppError::conflict(
                        "Custom code already exists",
                        json!({ "code": custom }),
                    ));
                }

                custom
            }
            None => self.generate_unique_code().await?,
        };

        let new_link = NewLink {
            id: generate_link_id()?,
            short_code,
            template_id,
            expires_at: draft.expires_at,
            utm: draft.utm.normalized(),
            editor_context: draft.editor_context,
        };

        let record = self.link_repository.create(new_link).await?;
        tracing::info!(
            link_id = %record.id,
            short_code = %record.short_code,
            template_id = %record.template_id,
            "Link created"
        );

        Ok(record)
    }

    /// Retrieves a link by its short code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no link has this code.
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn get_link(&self, short_code: &str) -> Result<LinkRecord, AppError> {
        self.link_repository
            .find_by_short_code(short_code)
            .await?
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "code": short_code })))
    }

    /// Retrieves a link together with its recorded event counts.
    ///
    /// # Errors
    ///
    /// See [`Self::get_link`]; sink errors are returned as [`AppError::Internal`].
    pub async fn get_link_details(
        &self,
        short_code: &str,
    ) -> Result<(LinkRecord, EventSummary), AppError> {
        let record = self.get_link(short_code).await?;
        let summary = self.analytics_sink.summarize(&record.id).await?;
        Ok((record, summary))
    }

    /// Total number of stored links.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on storage errors.
    pub async fn count_links(&self) -> Result<i64, AppError> {
        self.link_repository.count().await
    }

    /// Builds the public short URL for a code.
    pub fn short_url(&self, short_code: &str) -> String {
        format!(
            "{}/l/{}",
            self.public_base_url.trim_end_matches('/'),
            short_code
        )
    }

    /// Generates a code that is neither taken nor reserved.
    ///
    /// Attempts up to 10 times before failing.
    async fn generate_unique_code(&self) -> Result<String, AppError> {
        const MAX_ATTEMPTS: usize = 10;

        for _ in 0..MAX_ATTEMPTS {
            let code = generate_code()?;

            if RESERVED_CODES.contains(&code.as_str()) {
                continue;
            }

            if self
                .link_repository
                .find_by_short_code(&code)
                .await?
                .is_none()
            {
                return Ok(code);
            }
        }

        Err(AppError::internal(
            "Failed to generate unique code",
            json!({ "reason": "Too many collisions" }),
        ))
    }
}
