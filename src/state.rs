//! Shared application state injected into every handler.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::application::services::{LinkService, RedirectService, SessionService};
use crate::domain::entities::AnalyticsEvent;
use crate::domain::repositories::{AnalyticsSink, LinkRepository, SessionRepository};
use crate::infrastructure::cache::CacheService;

pub type DynRedirectService = RedirectService<dyn LinkRepository>;
pub type DynLinkService = LinkService<dyn LinkRepository, dyn AnalyticsSink>;
pub type DynSessionService = SessionService<dyn SessionRepository>;

/// Services and handles shared across requests.
///
/// Cloning is cheap: every field is reference counted.
#[derive(Clone)]
pub struct AppState {
    pub redirect_service: Arc<DynRedirectService>,
    pub link_service: Arc<DynLinkService>,
    pub session_service: Arc<DynSessionService>,
    /// Used by the health check; the link services keep their own handles.
    pub analytics_sink: Arc<dyn AnalyticsSink>,
    pub cache: Arc<dyn CacheService>,
    pub event_sender: mpsc::Sender<AnalyticsEvent>,
}
