//! Outgoing mail delivery.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::ContactConfig;

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("Mail service rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

impl MailError {
    fn rejected(status: reqwest::StatusCode, body: &str) -> Self {
        let body = if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated)", &body[..end])
        };
        MailError::Rejected {
            status: status.as_u16(),
            body,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

/// Sender for the Resend HTTP API.
#[derive(Clone)]
pub struct ResendMailer {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl ResendMailer {
    pub fn new(config: &ContactConfig, api_key: &str) -> Result<Self, MailError> {
        Self::with_base_url(config, api_key, &config.api_base)
    }

    pub fn with_base_url(config: &ContactConfig, api_key: &str, base_url: &str) -> Result<Self, MailError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/emails", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        debug!(to = ?email.to, "Sending contact email");
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(email)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::rejected(status, &body));
        }
        info!("Contact email sent");
        Ok(())
    }
}
