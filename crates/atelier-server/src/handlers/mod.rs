//! Request handlers.

pub mod contact;
pub mod health;
pub mod indexnow;
pub mod projects;

use std::time::Duration;

use atelier_core::RateLimitDecision;
use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tokio::time::Instant;
use tracing::warn;

use crate::middleware::client_key;
use crate::state::AppState;

/// CDN caching for a response whose data is cached for `ttl`
pub fn cache_control(ttl: Duration) -> String {
    let secs = ttl.as_secs();
    format!("public, s-maxage={}, stale-while-revalidate={}", secs, secs * 2)
}

/// 200 JSON response carrying a `Cache-Control` header for `ttl`
pub fn cached_json(ttl: Duration, body: Value) -> Response {
    ([(header::CACHE_CONTROL, cache_control(ttl))], Json(body)).into_response()
}

pub fn json_status(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

/// Count a request against the limiter for `scope`.
/// Each endpoint has its own budget per client.
pub fn check_rate_limit(state: &AppState, scope: &str, headers: &HeaderMap) -> Result<RateLimitDecision, Response> {
    let client = client_key(headers);
    let decision = state.rate_limiter.check(&format!("{}:{}", scope, client));
    if decision.allowed {
        return Ok(decision);
    }

    let retry_after = (decision.retry_after(Instant::now()).as_secs_f64().ceil() as u64).max(1);
    warn!(client = %client, scope, retry_after, "Request rate limited");
    Err((
        StatusCode::TOO_MANY_REQUESTS,
        [(header::RETRY_AFTER, retry_after.to_string())],
        Json(json!({ "error": "Too many requests. Please try again later." })),
    )
        .into_response())
}
