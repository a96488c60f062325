//! PostgreSQL implementation of the link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};
use sqlx::PgPool;
use sqlx::types::Json;
use std::sync::Arc;

use crate::domain::entities::{LinkRecord, NewLink, UtmParams};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

const LINK_COLUMNS: &str = r#"
    id, short_code, template_id, created_at, expires_at, clicks, last_clicked_at,
    utm_source, utm_medium, utm_campaign, utm_term, utm_content, editor_context
"#;

/// Raw `newsletter_links` row; nullable columns are defaulted in [`LinkRow::into_record`].
#[derive(Debug, sqlx::FromRow)]
struct LinkRow {
    id: String,
    short_code: String,
    template_id: String,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    clicks: Option<i64>,
    last_clicked_at: Option<DateTime<Utc>>,
    utm_source: Option<String>,
    utm_medium: Option<String>,
    utm_campaign: Option<String>,
    utm_term: Option<String>,
    utm_content: Option<String>,
    editor_context: Option<Json<Value>>,
}

impl LinkRow {
    fn into_record(self) -> LinkRecord {
        let editor_context = match self.editor_context.map(|Json(value)| value) {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };

        LinkRecord {
            id: self.id,
            short_code: self.short_code,
            template_id: self.template_id,
            created_at: self.created_at,
            expires_at: self.expires_at,
            clicks: self.clicks.unwrap_or(0),
            last_clicked_at: self.last_clicked_at,
            utm: UtmParams {
                source: self.utm_source.unwrap_or_default(),
                medium: self.utm_medium.unwrap_or_default(),
                campaign: self.utm_campaign,
                term: self.utm_term,
                content: self.utm_content,
            },
            editor_context,
        }
        .normalized()
    }
}

/// PostgreSQL repository for newsletter links.
///
/// Click counting is a single `UPDATE ... SET clicks = clicks + 1`, so
/// concurrent increments are serialized by the row lock.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<LinkRecord, AppError> {
        let editor_context = if new_link.editor_context.is_empty() {
            None
        } else {
            Some(Json(Value::Object(new_link.editor_context)))
        };

        let row = sqlx::query_as::<_, LinkRow>(&format!(
            r#"
            INSERT INTO newsletter_links
                (id, short_code, template_id, expires_at,
                 utm_source, utm_medium, utm_campaign, utm_term, utm_content, editor_context)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {LINK_COLUMNS}
            "#
        ))
        .bind(&new_link.id)
        .bind(&new_link.short_code)
        .bind(&new_link.template_id)
        .bind(new_link.expires_at)
        .bind(&new_link.utm.source)
        .bind(&new_link.utm.medium)
        .bind(&new_link.utm.campaign)
        .bind(&new_link.utm.term)
        .bind(&new_link.utm.content)
        .bind(editor_context)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into_record())
    }

    async fn find_by_short_code(&self, short_code: &str) -> Result<Option<LinkRecord>, AppError> {
        let row = sqlx::query_as::<_, LinkRow>(&format!(
            "SELECT {LINK_COLUMNS} FROM newsletter_links WHERE short_code = $1"
        ))
        .bind(short_code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(LinkRow::into_record))
    }

    async fn increment_clicks(&self, id: &str, clicked_at: DateTime<Utc>) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE newsletter_links
            SET clicks = COALESCE(clicks, 0) + 1, last_clicked_at = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(clicked_at)
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(
                "Link not found",
                json!({ "link_id": id }),
            ));
        }

        Ok(())
    }

    async fn count(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM newsletter_links")
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }
}
