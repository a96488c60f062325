//! Handlers for link generation and link details.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::link::{CreateLinkRequest, LinkDetailsResponse, LinkResponse};
use crate::application::services::LinkDraft;
use crate::domain::entities::Session;
use crate::error::AppError;
use crate::state::AppState;

/// Generates a shareable link for a newsletter template.
///
/// # Endpoint
///
/// `POST /api/links`
///
/// # Request Body
///
/// ```json
/// {
///   "template_id": "spring-issue",
///   "custom_code": "spring-26",
///   "expires_at": "2026-12-31T00:00:00Z",
///   "utm": { "campaign": "spring", "content": "hero" },
///   "editor_context": { "section": "hero" }
/// }
/// ```
///
/// Only `template_id` is required.
///
/// # Errors
///
/// Returns 400 Bad Request if validation fails or the code is reserved.
/// Returns 409 Conflict if the custom code is taken.
pub async fn create_link_handler(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<LinkResponse>), AppError> {
    payload.validate()?;

    let record = state
        .link_service
        .create_link(LinkDraft::from(payload))
        .await?;
    tracing::debug!(user_id = %session.user_id, short_code = %record.short_code, "Link generated");

    let short_url = state.link_service.short_url(&record.short_code);
    Ok((StatusCode::CREATED, Json(LinkResponse::new(record, short_url))))
}

/// Returns a link with its click counter and recorded event counts.
///
/// # Endpoint
///
/// `GET /api/links/{code}`
///
/// # Errors
///
/// Returns 404 Not Found if the short code doesn't exist.
pub async fn get_link_handler(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<LinkDetailsResponse>, AppError> {
    let (record, events) = state.link_service.get_link_details(&code).await?;
    let short_url = state.link_service.short_url(&record.short_code);

    Ok(Json(LinkDetailsResponse {
        link: LinkResponse::new(record, short_url),
        events,
    }))
}
