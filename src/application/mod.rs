//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating repository calls,
//! validation, and business rules. Services consume repository traits and provide
//! a clean API for HTTP handlers and the admin CLI.
//!
//! # Available Services
//!
//! - [`services::redirect_service::RedirectService`] - Link lookup, resolution and event dispatch
//! - [`services::link_service::LinkService`] - Link generation and retrieval with analytics
//! - [`services::session_service::SessionService`] - Session authentication and issuing

pub mod services;
