//! IndexNow URL submission.
//!
//! Tells participating search engines that pages on the site changed.
//! Requests are validated against the configured host before anything is
//! sent, and every endpoint is tried independently: one engine failing
//! never fails the submission as a whole.

use std::collections::HashSet;
use std::time::Duration;

use futures::future::join_all;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::IndexNowConfig;

/// Per-endpoint request timeout
const SUBMIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Incoming submission: a single `url`, a list of `urls`, or both.
/// Fields are kept loose so odd shapes are reported as invalid URLs
/// instead of failing the whole body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndexNowRequest {
    #[serde(default)]
    pub url: Option<Value>,
    /// Ignored unless it is an array
    #[serde(default)]
    pub urls: Option<Value>,
}

/// Text of a submitted entry; non-strings become their JSON text and fail validation
fn entry_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexNowError {
    #[error("No URLs provided. Use \"url\" or \"urls\" in request body.")]
    NoUrls,

    #[error("Invalid domain: URLs must be from {host}")]
    InvalidDomain { host: String, invalid_urls: Vec<String> },
}

/// Body posted to each endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmissionPayload<'a> {
    host: &'a str,
    key: &'a str,
    key_location: String,
    url_list: &'a [String],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub endpoint: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexNowSummary {
    /// True when at least one endpoint accepted the URLs
    pub success: bool,
    pub submitted: Vec<String>,
    pub results: Vec<SubmissionResult>,
    pub message: String,
}

/// Service description returned by the info endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexNowInfo {
    pub service: &'static str,
    pub key: String,
    pub key_location: String,
    pub endpoints: Vec<String>,
    pub usage: &'static str,
}

#[derive(Clone)]
pub struct IndexNowClient {
    client: Client,
    config: IndexNowConfig,
}

impl IndexNowClient {
    pub fn new(config: IndexNowConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(SUBMIT_TIMEOUT).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &IndexNowConfig {
        &self.config
    }

    pub fn info(&self) -> IndexNowInfo {
        IndexNowInfo {
            service: "IndexNow",
            key: self.config.key.clone(),
            key_location: self.config.key_location(),
            endpoints: self.config.endpoints.clone(),
            usage: r#"POST with { url: "..." } or { urls: [...] }"#,
        }
    }

    /// Whether `url` parses and points at the site host (bare or `www.`)
    pub fn is_allowed(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        if parsed.port().is_some() {
            return false;
        }
        match parsed.host_str() {
            Some(host) => {
                host == self.config.host
                    || host.strip_prefix("www.") == Some(self.config.host.as_str())
            }
            None => false,
        }
    }

    /// Gather the URLs of a request, validate them, and drop duplicates.
    /// `url` comes first, then `urls` in order.
    pub fn collect_urls(&self, request: IndexNowRequest) -> Result<Vec<String>, IndexNowError> {
        let single = request
            .url
            .filter(|v| !matches!(v, Value::Null | Value::Bool(false)))
            .map(entry_text)
            .filter(|u| !u.is_empty());
        let list = match request.urls {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        };
        let urls: Vec<String> = single
            .into_iter()
            .chain(list.into_iter().map(entry_text))
            .collect();

        if urls.is_empty() {
            return Err(IndexNowError::NoUrls);
        }

        let invalid_urls: Vec<String> = urls.iter().filter(|u| !self.is_allowed(u)).cloned().collect();
        if !invalid_urls.is_empty() {
            return Err(IndexNowError::InvalidDomain {
                host: self.config.host.clone(),
                invalid_urls,
            });
        }

        let mut seen = HashSet::new();
        Ok(urls.into_iter().filter(|u| seen.insert(u.clone())).collect())
    }

    /// Post `urls` to every endpoint concurrently. Never fails; per-endpoint
    /// problems are reported in the summary.
    pub async fn submit(&self, urls: Vec<String>) -> IndexNowSummary {
        let payload = SubmissionPayload {
            host: &self.config.host,
            key: &self.config.key,
            key_location: self.config.key_location(),
            url_list: &urls,
        };

        let results = join_all(
            self.config
                .endpoints
                .iter()
                .map(|endpoint| self.submit_to(endpoint, &payload)),
        )
        .await;

        let success = results.iter().any(|r| r.success);
        let message = if success {
            info!(count = urls.len(), "URLs submitted to IndexNow");
            "URLs submitted to IndexNow successfully"
        } else {
            warn!(count = urls.len(), "Every IndexNow endpoint rejected the submission");
            "Failed to submit to IndexNow endpoints, but request was processed"
        };

        IndexNowSummary {
            success,
            submitted: urls,
            results,
            message: message.to_string(),
        }
    }

    async fn submit_to(&self, endpoint: &str, payload: &SubmissionPayload<'_>) -> SubmissionResult {
        match self.client.post(endpoint).json(payload).send().await {
            Ok(response) => {
                let status = response.status();
                debug!(endpoint, status = status.as_u16(), "IndexNow endpoint answered");
                SubmissionResult {
                    endpoint: endpoint.to_string(),
                    success: status.is_success(),
                    status: Some(status.as_u16()),
                    error: None,
                }
            }
            Err(e) => {
                warn!(endpoint, error = %e, "IndexNow submission failed");
                SubmissionResult {
                    endpoint: endpoint.to_string(),
                    success: false,
                    status: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}
