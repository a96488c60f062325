//! Background consumer for analytics events.
//!
//! Redirect handlers push [`AnalyticsEvent`]s into a bounded channel and return
//! immediately. This worker drains the channel and performs the writes the
//! resolver leaves to its caller:
//!
//! - every `click` event bumps the link's counter once via
//!   [`LinkRepository::increment_clicks`]
//! - every event is appended to the [`AnalyticsSink`]
//!
//! The counter increment is not idempotent, so it is attempted exactly once:
//! a failure after the database committed would otherwise count the click
//! twice. Sink writes are retried with exponential backoff (at-least-once).
//! Failures are logged and counted, never surfaced to visitors.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc};
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, error, info};

use crate::domain::entities::AnalyticsEvent;
use crate::domain::repositories::{AnalyticsSink, LinkRepository};

const MAX_RETRIES: usize = 3;

fn retry_strategy() -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(10)
        .factor(2)
        .max_delay(Duration::from_secs(1))
        .map(jitter)
        .take(MAX_RETRIES)
}

/// Runs until the sending side of `rx` is dropped and every in-flight event is done.
///
/// At most `concurrency` events are processed at the same time.
pub async fn run_event_worker<L, S>(
    mut rx: mpsc::Receiver<AnalyticsEvent>,
    links: Arc<L>,
    sink: Arc<S>,
    concurrency: usize,
) where
    L: LinkRepository + ?Sized + 'static,
    S: AnalyticsSink + ?Sized + 'static,
{
    let concurrency = concurrency.max(1);
    let permits = Arc::new(Semaphore::new(concurrency));

    while let Some(event) = rx.recv().await {
        let Ok(permit) = permits.clone().acquire_owned().await else {
            break;
        };

        let links = links.clone();
        let sink = sink.clone();
        tokio::spawn(async move {
            process_event(links.as_ref(), sink.as_ref(), event).await;
            drop(permit);
        });
    }

    // Wait for in-flight events before reporting shutdown.
    let _ = permits.acquire_many(concurrency as u32).await;
    info!("Event worker stopped");
}

/// Applies one event: a single counter update for clicks, then the sink write.
pub async fn process_event<L, S>(links: &L, sink: &S, event: AnalyticsEvent)
where
    L: LinkRepository + ?Sized,
    S: AnalyticsSink + ?Sized,
{
    if event.is_click() {
        match links.increment_clicks(&event.link_id, event.timestamp).await {
            Ok(()) => debug!(link_id = %event.link_id, "Click counted"),
            Err(e) => {
                metrics::counter!("event_worker_failures_total", "operation" => "increment_clicks")
                    .increment(1);
                error!(link_id = %event.link_id, "Failed to increment clicks: {}", e);
            }
        }
    }

    let kind = event.kind;
    let link_id = event.link_id.clone();
    let result = Retry::spawn(retry_strategy(), move || sink.record(event.clone())).await;

    match result {
        Ok(()) => debug!(%link_id, %kind, "Event recorded"),
        Err(e) => {
            metrics::counter!("event_worker_failures_total", "operation" => "record_event")
                .increment(1);
            error!(%link_id, %kind, "Failed to record analytics event: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::EventKind;
    use crate::domain::repositories::{MockAnalyticsSink, MockLinkRepository};
    use crate::error::AppError;
    use chrono::Utc;
    use serde_json::json;

    fn event(kind: EventKind) -> AnalyticsEvent {
        AnalyticsEvent::new(kind, "lnk_1", "tmpl-1", None, Utc::now())
    }

    #[tokio::test]
    async fn test_click_increments_and_records() {
        let mut links = MockLinkRepository::new();
        let mut sink = MockAnalyticsSink::new();

        links
            .expect_increment_clicks()
            .withf(|id, _| id == "lnk_1")
            .times(1)
            .returning(|_, _| Ok(()));
        sink.expect_record()
            .withf(|e| e.kind == EventKind::Click)
            .times(1)
            .returning(|_| Ok(()));

        process_event(&links, &sink, event(EventKind::Click)).await;
    }

    #[tokio::test]
    async fn test_view_does_not_touch_counter() {
        let mut links = MockLinkRepository::new();
        let mut sink = MockAnalyticsSink::new();

        links.expect_increment_clicks().times(0);
        sink.expect_record().times(1).returning(|_| Ok(()));

        process_event(&links, &sink, event(EventKind::View)).await;
    }

    #[tokio::test]
    async fn test_failed_increment_is_not_repeated() {
        let mut links = MockLinkRepository::new();
        let mut sink = MockAnalyticsSink::new();

        links
            .expect_increment_clicks()
            .times(1)
            .returning(|_, _| Err(AppError::internal("Database error", json!({}))));
        sink.expect_record()
            .withf(|e| e.kind == EventKind::Click)
            .times(1)
            .returning(|_| Ok(()));

        process_event(&links, &sink, event(EventKind::Click)).await;
    }

    #[tokio::test]
    async fn test_transient_sink_failure_is_retried() {
        let mut links = MockLinkRepository::new();
        let mut sink = MockAnalyticsSink::new();

        let mut seq = mockall::Sequence::new();
        links
            .expect_increment_clicks()
            .times(1)
            .returning(|_, _| Ok(()));
        sink.expect_record()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(AppError::internal("Database error", json!({}))));
        sink.expect_record()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        process_event(&links, &sink, event(EventKind::Click)).await;
    }

    #[tokio::test]
    async fn test_sink_failure_does_not_panic() {
        let mut links = MockLinkRepository::new();
        let mut sink = MockAnalyticsSink::new();

        links.expect_increment_clicks().times(0);
        sink.expect_record()
            .times(MAX_RETRIES + 1)
            .returning(|_| Err(AppError::internal("Database error", json!({}))));

        process_event(&links, &sink, event(EventKind::Edit)).await;
    }

    #[tokio::test]
    async fn test_worker_drains_channel_before_returning() {
        let mut links = MockLinkRepository::new();
        let mut sink = MockAnalyticsSink::new();

        links
            .expect_increment_clicks()
            .times(2)
            .returning(|_, _| Ok(()));
        sink.expect_record().times(4).returning(|_| Ok(()));

        let (tx, rx) = mpsc::channel(16);
        for kind in [EventKind::Click, EventKind::View, EventKind::Click, EventKind::Edit] {
            tx.send(event(kind)).await.unwrap();
        }
        drop(tx);

        run_event_worker(rx, Arc::new(links), Arc::new(sink), 2).await;
    }
}
