//! Contact form handler.

use std::sync::Arc;

use atelier_core::ContactForm;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    Json,
};
use chrono::Utc;
use serde_json::json;
use tracing::{error, info, warn};

use super::{check_rate_limit, json_status};
use crate::state::AppState;

/// Validate a contact form submission and mail it to the site owner.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<ContactForm>, JsonRejection>,
) -> Response {
    if let Err(response) = check_rate_limit(&state, "contact", &headers) {
        return response;
    }

    let Json(form) = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(error = %rejection, "Malformed contact request");
            return json_status(StatusCode::BAD_REQUEST, json!({ "error": "Invalid JSON body" }));
        }
    };

    let message = match form.validate() {
        Ok(message) => message,
        Err(e) => return json_status(StatusCode::BAD_REQUEST, json!({ "error": e.to_string() })),
    };

    let Some(mailer) = state.mailer.as_ref() else {
        error!("Contact form used without a mail API key");
        return json_status(
            StatusCode::SERVICE_UNAVAILABLE,
            json!({ "error": "Contact form is temporarily unavailable. Please try again later." }),
        );
    };

    let email = message.to_email(&state.contact, Utc::now());
    if let Err(e) = mailer.send(&email).await {
        error!(error = %e, "Failed to send contact email");
        return json_status(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "Failed to send message. Please try again." }),
        );
    }

    info!("Contact message delivered");
    json_status(
        StatusCode::OK,
        json!({ "success": true, "message": "Your message has been sent successfully!" }),
    )
}
