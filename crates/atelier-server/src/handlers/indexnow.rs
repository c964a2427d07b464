//! IndexNow submission handlers.

use std::sync::Arc;

use atelier_core::{IndexNowError, IndexNowRequest};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{info, warn};

use super::{check_rate_limit, json_status};
use crate::state::AppState;

/// Submit one or more site URLs to IndexNow.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<IndexNowRequest>, JsonRejection>,
) -> Response {
    let decision = match check_rate_limit(&state, "indexnow", &headers) {
        Ok(decision) => decision,
        Err(response) => return response,
    };

    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(error = %rejection, "Malformed IndexNow request");
            return json_status(StatusCode::BAD_REQUEST, json!({ "error": "Invalid JSON body" }));
        }
    };

    let urls = match state.indexnow.collect_urls(request) {
        Ok(urls) => urls,
        Err(e) => {
            let body = match &e {
                IndexNowError::NoUrls => json!({ "error": e.to_string() }),
                IndexNowError::InvalidDomain { invalid_urls, .. } => {
                    warn!(count = invalid_urls.len(), "IndexNow request for foreign URLs");
                    json!({ "error": e.to_string(), "invalidUrls": invalid_urls })
                }
            };
            return json_status(StatusCode::BAD_REQUEST, body);
        }
    };

    info!(count = urls.len(), remaining = decision.remaining, "Submitting URLs to IndexNow");
    let summary = state.indexnow.submit(urls).await;
    (StatusCode::OK, Json(summary)).into_response()
}

/// Describe the service and how to call it.
pub async fn info(State(state): State<Arc<AppState>>) -> Response {
    Json(state.indexnow.info()).into_response()
}
