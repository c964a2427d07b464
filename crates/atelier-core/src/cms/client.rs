//! Client for the Sanity HTTP query API.
//!
//! This module provides the `CmsClient` struct for running GROQ queries
//! and the `ContentSource` trait it implements.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::CmsConfig;

use super::CmsError;

/// Query parameters, bound as `$name` inside GROQ.
/// Ordered so that equal parameter sets serialize identically.
pub type QueryParams = BTreeMap<String, Value>;

/// Anything that can answer a content query with raw JSON.
///
/// A `Value::Null` result means the query ran and matched nothing.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn query(&self, query: &str, params: &QueryParams) -> Result<Value, CmsError>;
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    result: Value,
}

/// Content API client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct CmsClient {
    client: Client,
    query_url: String,
    token: Option<String>,
}

impl CmsClient {
    /// Create a client for the project and dataset in `config`
    pub fn new(config: &CmsConfig) -> Result<Self, CmsError> {
        Self::with_base_url(config, &config.api_host())
    }

    /// Create a client that talks to `base_url` instead of the hosted API.
    pub fn with_base_url(config: &CmsConfig, base_url: &str) -> Result<Self, CmsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let query_url = format!(
            "{}/v{}/data/query/{}",
            base_url.trim_end_matches('/'),
            config.api_version,
            config.dataset
        );

        Ok(Self {
            client,
            query_url,
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }

    pub fn query_url(&self) -> &str {
        &self.query_url
    }

    /// Build the `query` and `$param` pairs for the request URL.
    /// Parameter values are JSON-encoded as the API expects.
    fn query_pairs(query: &str, params: &QueryParams) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(params.len() + 1);
        pairs.push(("query".to_string(), query.to_string()));
        for (name, value) in params {
            pairs.push((format!("${}", name), value.to_string()));
        }
        pairs
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, CmsError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(CmsError::from_status(status, &body))
        }
    }
}

#[async_trait]
impl ContentSource for CmsClient {
    async fn query(&self, query: &str, params: &QueryParams) -> Result<Value, CmsError> {
        let mut request = self
            .client
            .get(&self.query_url)
            .header(header::ACCEPT, "application/json")
            .query(&Self::query_pairs(query, params));

        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let response = Self::check_response(response).await?;

        let text = response.text().await?;
        let parsed: QueryResponse = serde_json::from_str(&text)
            .map_err(|e| CmsError::InvalidResponse(format!("Failed to parse query response: {}", e)))?;

        debug!(url = %self.query_url, null = parsed.result.is_null(), "Content query answered");
        Ok(parsed.result)
    }
}
