//! PostgreSQL integration tests; run with `cargo test -- --ignored` and `DATABASE_URL` set.

use chrono::Utc;
use newsletter_links::domain::entities::{AnalyticsEvent, EventKind, NewLink, UtmParams};
use newsletter_links::domain::repositories::{AnalyticsSink, LinkRepository};
use newsletter_links::error::AppError;
use newsletter_links::infrastructure::persistence::{PgAnalyticsSink, PgLinkRepository};
use serde_json::{Map, json};
use sqlx::PgPool;
use std::sync::Arc;

fn new_link(code: &str) -> NewLink {
    NewLink {
        id: format!("lnk_{}", code),
        short_code: code.to_string(),
        template_id: "tmpl-1".to_string(),
        expires_at: None,
        utm: UtmParams::default(),
        editor_context: Map::new(),
    }
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL instance (DATABASE_URL)"]
async fn test_create_and_find_link(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    let mut context = Map::new();
    context.insert("section".to_string(), json!("hero"));
    let created = repo
        .create(NewLink {
            utm: UtmParams {
                campaign: Some("spring".to_string()),
                ..UtmParams::default()
            },
            editor_context: context.clone(),
            ..new_link("spring-26")
        })
        .await
        .unwrap();

    assert_eq!(created.clicks, 0);
    assert!(created.last_clicked_at.is_none());

    let found = repo.find_by_short_code("spring-26").await.unwrap().unwrap();
    assert_eq!(found.id, "lnk_spring-26");
    assert_eq!(found.utm.campaign.as_deref(), Some("spring"));
    assert_eq!(found.editor_context, context);
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL instance (DATABASE_URL)"]
async fn test_find_missing_link(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    assert!(repo.find_by_short_code("nope").await.unwrap().is_none());
    assert_eq!(repo.count().await.unwrap(), 0);
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL instance (DATABASE_URL)"]
async fn test_duplicate_code_conflicts(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    repo.create(new_link("dup-code")).await.unwrap();
    let result = repo
        .create(NewLink {
            id: "lnk_other".to_string(),
            ..new_link("dup-code")
        })
        .await;

    assert!(matches!(result, Err(AppError::Conflict { .. })));
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL instance (DATABASE_URL)"]
async fn test_concurrent_increments_are_not_lost(pool: PgPool) {
    let repo = Arc::new(PgLinkRepository::new(Arc::new(pool)));
    repo.create(new_link("busy")).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..20 {
        let repo = repo.clone();
        handles.push(tokio::spawn(async move {
            repo.increment_clicks("lnk_busy", Utc::now()).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let record = repo.find_by_short_code("busy").await.unwrap().unwrap();
    assert_eq!(record.clicks, 20);
    assert!(record.last_clicked_at.is_some());
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL instance (DATABASE_URL)"]
async fn test_increment_unknown_link(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    let result = repo.increment_clicks("lnk_missing", Utc::now()).await;
    assert!(matches!(result, Err(AppError::NotFound { .. })));
}

#[sqlx::test]
#[ignore = "requires a PostgreSQL instance (DATABASE_URL)"]
async fn test_sink_records_and_summarizes(pool: PgPool) {
    let pool = Arc::new(pool);
    let links = PgLinkRepository::new(pool.clone());
    let sink = PgAnalyticsSink::new(pool);
    let record = links.create(new_link("events")).await.unwrap();

    for kind in [EventKind::Click, EventKind::View, EventKind::Click, EventKind::Edit] {
        sink.record(AnalyticsEvent::new(
            kind,
            record.id.clone(),
            record.template_id.clone(),
            Some("user-1".to_string()),
            Utc::now(),
        ))
        .await
        .unwrap();
    }

    let summary = sink.summarize(&record.id).await.unwrap();
    assert_eq!(summary.clicks, 2);
    assert_eq!(summary.views, 1);
    assert_eq!(summary.edits, 1);
    assert!(sink.health_check().await);
}
