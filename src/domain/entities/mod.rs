//! Core domain entities.
//!
//! Entities are plain data structures; the decision logic that consumes them
//! lives in [`crate::domain::resolver`].
//!
//! # Entity Types
//!
//! - [`LinkRecord`] - A shareable newsletter link pointing at a template
//! - [`AnalyticsEvent`] - A click, view or edit produced by a resolution
//! - [`Session`] - An authenticated user session with its subscription tier
//!
//! Creation inputs use separate structs (`NewLink`, `NewSession`).

pub mod event;
pub mod link;
pub mod session;

pub use event::{AnalyticsEvent, EventKind, EventSummary};
pub use link::{DEFAULT_UTM_MEDIUM, DEFAULT_UTM_SOURCE, LinkRecord, NewLink, UtmParams};
pub use session::{NewSession, Session, SubscriptionTier};
