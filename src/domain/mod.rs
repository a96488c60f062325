//! Domain layer containing business entities and logic.
//!
//! This module holds the link resolution rules and the contracts of the
//! collaborators around them, independent of HTTP and storage concerns.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`context`] - Per-request access facts and UTM overrides
//! - [`resolver`] - Pure redirect decision function
//! - [`repositories`] - Data access trait definitions
//! - [`event_worker`] - Asynchronous analytics/click processing worker
//!
//! # Redirect Flow
//!
//! 1. HTTP handler builds a [`context::RequestContext`] from the session
//! 2. The link is looked up through [`repositories::LinkRepository`]
//! 3. [`resolver::RedirectResolver`] picks the destination and events
//! 4. Events are sent to an async channel
//! 5. [`event_worker::run_event_worker`] counts clicks and records events

pub mod context;
pub mod entities;
pub mod event_worker;
pub mod repositories;
pub mod resolver;
