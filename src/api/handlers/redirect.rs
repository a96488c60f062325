//! Handler for newsletter link redirects.

use axum::{
    extract::{Path, Query, State, rejection::QueryRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::api::dto::redirect::RedirectQuery;
use crate::state::AppState;
use crate::utils::session_token::extract_session_token;

/// Redirects a short code to the editor, the template preview, the auth page,
/// the expired page or home.
///
/// # Endpoint
///
/// `GET /l/{code}`
///
/// # Request Flow
///
/// 1. Build the request context from the session token (Bearer header or
///    `session_token` cookie); anything but an active session is anonymous
/// 2. Apply `to_editor` and `utm_*` query parameters
/// 3. Resolve the link (cache, then store)
/// 4. Dispatch analytics events to the background worker
/// 5. Return 307 Temporary Redirect with `Cache-Control: no-store`
///
/// Never responds with an error: unknown codes and lookup failures redirect home.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    query: Result<Query<RedirectQuery>, QueryRejection>,
    headers: HeaderMap,
) -> Response {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            debug!("Ignoring malformed redirect query: {}", rejection);
            RedirectQuery::default()
        }
    };

    let token = extract_session_token(&headers);
    let ctx = state
        .session_service
        .context_for(token.as_deref())
        .await
        .with_force_editor_mode(query.force_editor_mode());

    let result = state
        .redirect_service
        .resolve_code(&code, &ctx, &query.utm_overrides())
        .await;

    let location = HeaderValue::from_str(&result.redirect_url)
        .unwrap_or_else(|_| HeaderValue::from_static("/"));

    (
        StatusCode::TEMPORARY_REDIRECT,
        [
            (header::LOCATION, location),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
        ],
    )
        .into_response()
}
