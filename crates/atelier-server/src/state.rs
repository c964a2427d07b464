//! Application state shared across handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use atelier_core::config::ContactConfig;
use atelier_core::fetch::{QueryCache, ResilientFetcher};
use atelier_core::{CmsClient, Config, IndexNowClient, Mailer, RateLimiter, ResendMailer};
use tracing::warn;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub fetcher: ResilientFetcher,
    pub rate_limiter: Arc<RateLimiter>,
    pub indexnow: IndexNowClient,
    pub contact: ContactConfig,
    /// Absent when no mail API key is configured
    pub mailer: Option<Arc<dyn Mailer>>,
}

impl AppState {
    pub fn new(fetcher: ResilientFetcher, rate_limiter: Arc<RateLimiter>, indexnow: IndexNowClient) -> Self {
        Self {
            fetcher,
            rate_limiter,
            indexnow,
            contact: ContactConfig::default(),
            mailer: None,
        }
    }

    pub fn with_contact(mut self, contact: ContactConfig, mailer: Option<Arc<dyn Mailer>>) -> Self {
        self.contact = contact;
        self.mailer = mailer;
        self
    }

    /// Wire the content client, cache, limiter, IndexNow client and mailer from `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let cms = CmsClient::new(&config.cms).context("Failed to create content API client")?;
        let cache = Arc::new(QueryCache::new(config.cache.max_entries));
        let fetcher = ResilientFetcher::new(Arc::new(cms), cache);
        let rate_limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
        let indexnow =
            IndexNowClient::new(config.indexnow.clone()).context("Failed to create IndexNow client")?;

        let mailer: Option<Arc<dyn Mailer>> = match config.contact.api_key() {
            Some(key) => Some(Arc::new(
                ResendMailer::new(&config.contact, key).context("Failed to create mail client")?,
            )),
            None => {
                warn!("No mail API key configured, contact form is disabled");
                None
            }
        };

        Ok(Self::new(fetcher, rate_limiter, indexnow).with_contact(config.contact.clone(), mailer))
    }
}
