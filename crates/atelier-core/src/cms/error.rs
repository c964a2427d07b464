use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CmsError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unauthorized - check the API token")]
    Unauthorized,

    #[error("Rate limited by the content API")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Query timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl CmsError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 => CmsError::Unauthorized,
            403 => CmsError::AccessDenied(truncated),
            429 => CmsError::RateLimited,
            500..=599 => CmsError::ServerError(truncated),
            _ => CmsError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }
}
