//! PostgreSQL implementation of the analytics sink.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{AnalyticsEvent, EventKind, EventSummary};
use crate::domain::repositories::AnalyticsSink;
use crate::error::AppError;

/// Appends analytics events to the `link_events` table.
pub struct PgAnalyticsSink {
    pool: Arc<PgPool>,
}

impl PgAnalyticsSink {
    /// Creates a new sink with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalyticsSink for PgAnalyticsSink {
    async fn record(&self, event: AnalyticsEvent) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO link_events (kind, link_id, template_id, user_id, occurred_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(event.kind.as_str())
        .bind(&event.link_id)
        .bind(&event.template_id)
        .bind(&event.user_id)
        .bind(event.timestamp)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn summarize(&self, link_id: &str) -> Result<EventSummary, AppError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT kind, COUNT(*)
            FROM link_events
            WHERE link_id = $1
            GROUP BY kind
            "#,
        )
        .bind(link_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        let mut summary = EventSummary::default();
        for (kind, count) in rows {
            match kind.parse::<EventKind>() {
                Ok(EventKind::Click) => summary.clicks = count,
                Ok(EventKind::View) => summary.views = count,
                Ok(EventKind::Edit) => summary.edits = count,
                Err(e) => tracing::warn!("Skipping unknown event kind in link_events: {}", e),
            }
        }

        Ok(summary)
    }

    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await
            .is_ok()
    }
}
