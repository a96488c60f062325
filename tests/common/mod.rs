#![allow(dead_code)]

use axum::extract::ConnectInfo;
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use newsletter_links::application::services::{LinkService, RedirectService, SessionService};
use newsletter_links::domain::entities::{
    AnalyticsEvent, LinkRecord, NewLink, SubscriptionTier, UtmParams,
};
use newsletter_links::domain::event_worker::process_event;
use newsletter_links::domain::repositories::{AnalyticsSink, LinkRepository, SessionRepository};
use newsletter_links::domain::resolver::{RedirectResolver, ResolverConfig};
use newsletter_links::infrastructure::cache::NullCache;
use newsletter_links::infrastructure::persistence::{
    MemoryAnalyticsSink, MemoryLinkRepository, MemorySessionRepository,
};
use newsletter_links::routes::build_router;
use newsletter_links::state::AppState;
use serde_json::{Map, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tower::Layer;

pub const PUBLIC_BASE_URL: &str = "https://links.example.com";

#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}

/// Full application over in-memory storage, with the event queue exposed.
pub struct TestApp {
    pub server: TestServer,
    pub links: Arc<MemoryLinkRepository>,
    pub sink: Arc<MemoryAnalyticsSink>,
    pub sessions: SessionService<MemorySessionRepository>,
    pub events: mpsc::Receiver<AnalyticsEvent>,
}

pub fn create_test_app() -> TestApp {
    create_test_app_with(ResolverConfig::default())
}

pub fn create_test_app_with(resolver_config: ResolverConfig) -> TestApp {
    let links = Arc::new(MemoryLinkRepository::new());
    let sink = Arc::new(MemoryAnalyticsSink::new());
    let session_repo = Arc::new(MemorySessionRepository::new());
    let (tx, rx) = mpsc::channel(100);

    let redirect_service = Arc::new(RedirectService::new(
        links.clone() as Arc<dyn LinkRepository>,
        Arc::new(NullCache::new()),
        RedirectResolver::new(resolver_config),
        tx.clone(),
    ));
    let link_service = Arc::new(LinkService::new(
        links.clone() as Arc<dyn LinkRepository>,
        sink.clone() as Arc<dyn AnalyticsSink>,
        PUBLIC_BASE_URL.to_string(),
    ));
    let session_service = Arc::new(SessionService::new(
        session_repo.clone() as Arc<dyn SessionRepository>,
        "test-signing-secret".to_string(),
    ));

    let state = AppState {
        redirect_service,
        link_service,
        session_service,
        analytics_sink: sink.clone(),
        cache: Arc::new(NullCache::new()),
        event_sender: tx,
    };

    let app = build_router(state).layer(MockConnectInfoLayer);
    let server = TestServer::new(app).unwrap();

    TestApp {
        server,
        links,
        sink,
        sessions: SessionService::new(session_repo, "test-signing-secret".to_string()),
        events: rx,
    }
}

impl TestApp {
    pub async fn create_link(
        &self,
        code: &str,
        template_id: &str,
        expires_at: Option<DateTime<Utc>>,
        utm: UtmParams,
        editor_context: Map<String, Value>,
    ) -> LinkRecord {
        self.links
            .create(NewLink {
                id: format!("lnk_{}", code),
                short_code: code.to_string(),
                template_id: template_id.to_string(),
                expires_at,
                utm,
                editor_context,
            })
            .await
            .unwrap()
    }

    pub async fn create_simple_link(&self, code: &str, template_id: &str) -> LinkRecord {
        self.create_link(code, template_id, None, UtmParams::default(), Map::new())
            .await
    }

    /// Issues a session and returns its raw token.
    pub async fn session_token(&self, tier: Option<SubscriptionTier>) -> String {
        let (token, _) = self.sessions.issue("user-1", tier, Some(1)).await.unwrap();
        token
    }

    /// Takes every queued event and applies it the way the background worker does.
    pub async fn drain_events(&mut self) -> Vec<AnalyticsEvent> {
        let mut drained = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            process_event(self.links.as_ref(), self.sink.as_ref(), event.clone()).await;
            drained.push(event);
        }
        drained
    }
}
