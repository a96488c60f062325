//! API route configuration.
//!
//! All API endpoints require Bearer session authentication via
//! [`crate::api::middleware::auth`].

use crate::api::handlers::{create_link_handler, get_link_handler};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// All API routes, protected by Bearer session authentication.
///
/// # Endpoints
///
/// - `POST /links`          - Generate a shareable link for a template
/// - `GET  /links/{code}`   - Link details with event counts
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/links", post(create_link_handler))
        .route("/links/{code}", get(get_link_handler))
}
