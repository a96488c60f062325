//! Redirect orchestration around the pure resolver.
//!
//! Looks the link up (cache first, then the store), resolves it with the
//! current time and hands the resulting events to the background worker.
//! Lookup failures degrade to the home redirect; a full event queue drops
//! events. Neither ever fails the redirect.

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, warn};

use crate::domain::context::{RequestContext, UtmOverrides};
use crate::domain::entities::{AnalyticsEvent, LinkRecord};
use crate::domain::repositories::LinkRepository;
use crate::domain::resolver::{RedirectResolver, ResolutionResult};
use crate::infrastructure::cache::CacheService;

/// Service resolving short codes into redirects and dispatching their events.
pub struct RedirectService<L: LinkRepository + ?Sized> {
    link_repository: Arc<L>,
    cache: Arc<dyn CacheService>,
    resolver: RedirectResolver,
    event_sender: mpsc::Sender<AnalyticsEvent>,
}

impl<L: LinkRepository + ?Sized> RedirectService<L> {
    pub fn new(
        link_repository: Arc<L>,
        cache: Arc<dyn CacheService>,
        resolver: RedirectResolver,
        event_sender: mpsc::Sender<AnalyticsEvent>,
    ) -> Self {
        Self {
            link_repository,
            cache,
            resolver,
            event_sender,
        }
    }

    /// Resolves a short code for one request. Never fails.
    pub async fn resolve_code(
        &self,
        short_code: &str,
        ctx: &RequestContext,
        overrides: &UtmOverrides,
    ) -> ResolutionResult {
        let record = self.lookup(short_code).await;
        let result = self
            .resolver
            .resolve(record.as_ref(), ctx, overrides, Utc::now());

        metrics::counter!("redirects_total", "destination" => result.destination.as_str())
            .increment(1);
        debug!(
            short_code,
            destination = result.destination.as_str(),
            events = result.events.len(),
            "Link resolved"
        );

        self.dispatch(&result.events);

        result
    }

    /// Finds a link by code, treating any failure as "not found".
    async fn lookup(&self, short_code: &str) -> Option<LinkRecord> {
        match self.cache.get_link(short_code).await {
            Ok(Some(record)) => {
                debug!("Cache HIT for {}", short_code);
                return Some(record);
            }
            Ok(None) => debug!("Cache MISS for {}", short_code),
            Err(e) => error!("Cache error: {}", e),
        }

        match self.link_repository.find_by_short_code(short_code).await {
            Ok(Some(record)) => {
                // Asynchronously update cache (fire-and-forget)
                let cache = self.cache.clone();
                let cached = record.clone();
                tokio::spawn(async move {
                    if let Err(e) = cache.set_link(&cached, None).await {
                        error!("Failed to cache link: {}", e);
                    }
                });

                Some(record)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(short_code, "Link lookup failed, redirecting home: {}", e);
                None
            }
        }
    }

    fn dispatch(&self, events: &[AnalyticsEvent]) {
        for event in events {
            match self.event_sender.try_send(event.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(event)) => {
                    metrics::counter!("analytics_events_dropped_total", "reason" => "queue_full")
                        .increment(1);
                    warn!(link_id = %event.link_id, kind = %event.kind, "Event queue full, dropping event");
                }
                Err(TrySendError::Closed(event)) => {
                    metrics::counter!("analytics_events_dropped_total", "reason" => "queue_closed")
                        .increment(1);
                    warn!(link_id = %event.link_id, kind = %event.kind, "Event queue closed, dropping event");
                }
            }
        }
    }
}
