//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Components Checked
///
/// 1. **Database**: Counts links and pings the analytics store
/// 2. **Event Queue**: Checks if channel is open and reports free capacity
/// 3. **Cache**: Tests Redis PING (always ok when caching is disabled)
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let db_check = check_database(&state).await;
    let queue_check = check_event_queue(&state);
    let cache_check = check_cache(&state).await;

    let all_healthy = db_check.is_ok() && queue_check.is_ok() && cache_check.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            database: db_check,
            event_queue: queue_check,
            cache: cache_check,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn check_database(state: &AppState) -> CheckStatus {
    let links = match state.link_service.count_links().await {
        Ok(count) => count,
        Err(e) => return CheckStatus::error(format!("Database error: {}", e)),
    };

    if state.analytics_sink.health_check().await {
        CheckStatus::ok(format!("Connected, {} links", links))
    } else {
        CheckStatus::error("Analytics store unreachable")
    }
}

fn check_event_queue(state: &AppState) -> CheckStatus {
    if state.event_sender.is_closed() {
        CheckStatus::error("Event queue is closed")
    } else {
        CheckStatus::ok(format!(
            "Capacity: {}/{}",
            state.event_sender.capacity(),
            state.event_sender.max_capacity()
        ))
    }
}

async fn check_cache(state: &AppState) -> CheckStatus {
    if state.cache.health_check().await {
        CheckStatus::ok("Cache available")
    } else {
        CheckStatus::error("Cache connection failed")
    }
}
