//! In-process implementations of the repository traits.
//!
//! Selected with `STORAGE_BACKEND=memory` for local runs without PostgreSQL,
//! and used by the HTTP integration tests. Data lives only as long as the
//! process.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use crate::domain::entities::{
    AnalyticsEvent, EventSummary, LinkRecord, NewLink, NewSession, Session,
};
use crate::domain::repositories::{AnalyticsSink, LinkRepository, SessionRepository};
use crate::error::AppError;

fn lock_poisoned() -> AppError {
    AppError::internal("Storage lock poisoned", json!({}))
}

#[derive(Default)]
struct LinkTable {
    by_id: HashMap<String, LinkRecord>,
    id_by_code: HashMap<String, String>,
}

/// Link store backed by a `HashMap` with a short-code index.
#[derive(Default)]
pub struct MemoryLinkRepository {
    table: RwLock<LinkTable>,
}

impl MemoryLinkRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LinkRepository for MemoryLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<LinkRecord, AppError> {
        let mut table = self.table.write().map_err(|_| lock_poisoned())?;

        if table.id_by_code.contains_key(&new_link.short_code)
            || table.by_id.contains_key(&new_link.id)
        {
            return Err(AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": "newsletter_links_short_code_key" }),
            ));
        }

        let record = new_link.into_record(Utc::now());
        table
            .id_by_code
            .insert(record.short_code.clone(), record.id.clone());
        table.by_id.insert(record.id.clone(), record.clone());

        Ok(record)
    }

    async fn find_by_short_code(&self, short_code: &str) -> Result<Option<LinkRecord>, AppError> {
        let table = self.table.read().map_err(|_| lock_poisoned())?;

        Ok(table
            .id_by_code
            .get(short_code)
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }

    async fn increment_clicks(&self, id: &str, clicked_at: DateTime<Utc>) -> Result<(), AppError> {
        let mut table = self.table.write().map_err(|_| lock_poisoned())?;

        let record = table
            .by_id
            .get_mut(id)
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "link_id": id })))?;
        record.clicks += 1;
        record.last_clicked_at = Some(clicked_at);

        Ok(())
    }

    async fn count(&self) -> Result<i64, AppError> {
        let table = self.table.read().map_err(|_| lock_poisoned())?;
        Ok(table.by_id.len() as i64)
    }
}

/// Analytics sink that keeps every event in memory.
#[derive(Default)]
pub struct MemoryAnalyticsSink {
    events: Mutex<Vec<AnalyticsEvent>>,
}

impl MemoryAnalyticsSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events in arrival order.
    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AnalyticsSink for MemoryAnalyticsSink {
    async fn record(&self, event: AnalyticsEvent) -> Result<(), AppError> {
        self.events
            .lock()
            .map_err(|_| lock_poisoned())?
            .push(event);
        Ok(())
    }

    async fn summarize(&self, link_id: &str) -> Result<EventSummary, AppError> {
        let events = self.events.lock().map_err(|_| lock_poisoned())?;

        let mut summary = EventSummary::default();
        for event in events.iter().filter(|e| e.link_id == link_id) {
            summary.add(event.kind);
        }

        Ok(summary)
    }

    async fn health_check(&self) -> bool {
        !self.events.is_poisoned()
    }
}

/// Session store backed by a `Vec`, with sequential ids.
#[derive(Default)]
pub struct MemorySessionRepository {
    sessions: Mutex<Vec<Session>>,
}

impl MemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn find_active(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, AppError> {
        let sessions = self.sessions.lock().map_err(|_| lock_poisoned())?;

        Ok(sessions
            .iter()
            .find(|s| s.token_hash == token_hash && s.is_active_at(now))
            .cloned())
    }

    async fn touch(&self, token_hash: &str, at: DateTime<Utc>) -> Result<(), AppError> {
        let mut sessions = self.sessions.lock().map_err(|_| lock_poisoned())?;

        if let Some(session) = sessions
            .iter_mut()
            .find(|s| s.token_hash == token_hash && s.revoked_at.is_none())
        {
            session.last_used_at = Some(at);
        }

        Ok(())
    }

    async fn create(&self, new_session: NewSession) -> Result<Session, AppError> {
        let mut sessions = self.sessions.lock().map_err(|_| lock_poisoned())?;

        if sessions
            .iter()
            .any(|s| s.token_hash == new_session.token_hash)
        {
            return Err(AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": "user_sessions_token_hash_key" }),
            ));
        }

        let session = Session {
            id: sessions.len() as i64 + 1,
            user_id: new_session.user_id,
            subscription_tier: new_session.subscription_tier,
            token_hash: new_session.token_hash,
            created_at: Utc::now(),
            expires_at: new_session.expires_at,
            revoked_at: None,
            last_used_at: None,
        };
        sessions.push(session.clone());

        Ok(session)
    }

    async fn list(&self) -> Result<Vec<Session>, AppError> {
        let sessions = self.sessions.lock().map_err(|_| lock_poisoned())?;
        Ok(sessions.iter().rev().cloned().collect())
    }

    async fn revoke(&self, id: i64) -> Result<bool, AppError> {
        let mut sessions = self.sessions.lock().map_err(|_| lock_poisoned())?;

        match sessions
            .iter_mut()
            .find(|s| s.id == id && s.revoked_at.is_none())
        {
            Some(session) => {
                session.revoked_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{EventKind, SubscriptionTier, UtmParams};
    use chrono::Duration;
    use serde_json::Map;
    use std::sync::Arc;

    fn new_link(id: &str, code: &str) -> NewLink {
        NewLink {
            id: id.to_string(),
            short_code: code.to_string(),
            template_id: "tmpl-1".to_string(),
            expires_at: None,
            utm: UtmParams::default(),
            editor_context: Map::new(),
        }
    }

    #[tokio::test]
    async fn test_link_create_and_lookup() {
        let repo = MemoryLinkRepository::new();
        let created = repo.create(new_link("lnk_1", "abc123")).await.unwrap();

        let by_code = repo.find_by_short_code("abc123").await.unwrap().unwrap();

        assert_eq!(by_code, created);
        assert!(repo.find_by_short_code("missing").await.unwrap().is_none());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_link_duplicate_code_conflicts() {
        let repo = MemoryLinkRepository::new();
        repo.create(new_link("lnk_1", "abc123")).await.unwrap();

        let result = repo.create(new_link("lnk_2", "abc123")).await;
        assert!(matches!(result, Err(AppError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let repo = Arc::new(MemoryLinkRepository::new());
        repo.create(new_link("lnk_1", "abc123")).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..50 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.increment_clicks("lnk_1", Utc::now()).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let record = repo.find_by_short_code("abc123").await.unwrap().unwrap();
        assert_eq!(record.clicks, 50);
        assert!(record.last_clicked_at.is_some());
    }

    #[tokio::test]
    async fn test_increment_unknown_link_is_not_found() {
        let repo = MemoryLinkRepository::new();
        let result = repo.increment_clicks("nope", Utc::now()).await;
        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_sink_summarize_per_link() {
        let sink = MemoryAnalyticsSink::new();
        let now = Utc::now();
        for (kind, link) in [
            (EventKind::Click, "a"),
            (EventKind::View, "a"),
            (EventKind::Click, "b"),
            (EventKind::Edit, "a"),
        ] {
            sink.record(AnalyticsEvent::new(kind, link, "t", None, now))
                .await
                .unwrap();
        }

        let summary = sink.summarize("a").await.unwrap();
        assert_eq!(
            summary,
            EventSummary {
                clicks: 1,
                views: 1,
                edits: 1
            }
        );
        assert_eq!(sink.events().len(), 4);
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let repo = MemorySessionRepository::new();
        let session = repo
            .create(NewSession {
                user_id: "user-1".to_string(),
                subscription_tier: Some(SubscriptionTier::Pro),
                token_hash: "hash-1".to_string(),
                expires_at: Some(Utc::now() + Duration::days(1)),
            })
            .await
            .unwrap();

        let found = repo.find_active("hash-1", Utc::now()).await.unwrap();
        assert_eq!(found.unwrap().id, session.id);

        assert!(repo.revoke(session.id).await.unwrap());
        assert!(!repo.revoke(session.id).await.unwrap());
        assert!(repo.find_active("hash-1", Utc::now()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_session_is_inactive() {
        let repo = MemorySessionRepository::new();
        repo.create(NewSession {
            user_id: "user-2".to_string(),
            subscription_tier: None,
            token_hash: "hash-2".to_string(),
            expires_at: Some(Utc::now() - Duration::minutes(1)),
        })
        .await
        .unwrap();

        assert!(repo.find_active("hash-2", Utc::now()).await.unwrap().is_none());
    }
}
