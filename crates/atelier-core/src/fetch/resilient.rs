//! Retry, timeout and caching around content queries.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::cms::{CmsError, ContentSource, QueryParams};

use super::cache::{CacheKey, QueryCache};

/// Default number of additional attempts after the first failure
const DEFAULT_RETRIES: u32 = 3;

/// Default per-attempt budget
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default cache lifetime for a successful result
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(600);

#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Additional attempts after the first failure
    pub retries: u32,
    /// Wall-clock budget per attempt; an attempt over budget counts as a failure
    pub timeout: Duration,
    pub cache: bool,
    pub cache_ttl: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            timeout: DEFAULT_TIMEOUT,
            cache: true,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }
}

/// Delay between attempts: `min(initial * 2^(attempt-1), max)` plus random jitter.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    pub initial: Duration,
    pub max: Duration,
    pub jitter: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(1000),
            max: Duration::from_millis(5000),
            jitter: Duration::from_millis(1000),
        }
    }
}

impl Backoff {
    /// No delay between attempts
    pub fn none() -> Self {
        Self {
            initial: Duration::ZERO,
            max: Duration::ZERO,
            jitter: Duration::ZERO,
        }
    }

    /// Delay after the failed `attempt` (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        let base = self.initial.saturating_mul(factor).min(self.max);
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return base;
        }
        base + Duration::from_millis(rand::thread_rng().gen_range(0..jitter_ms))
    }
}

/// Result of a resilient fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    /// The source answered with content
    Found(T),
    /// The source answered, but nothing matched
    NotFound,
    /// Every attempt failed or timed out, or the payload was unusable
    Unavailable,
}

impl<T> FetchOutcome<T> {
    pub fn found(self) -> Option<T> {
        match self {
            FetchOutcome::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, FetchOutcome::Unavailable)
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> FetchOutcome<U> {
        match self {
            FetchOutcome::Found(value) => FetchOutcome::Found(f(value)),
            FetchOutcome::NotFound => FetchOutcome::NotFound,
            FetchOutcome::Unavailable => FetchOutcome::Unavailable,
        }
    }
}

/// Fetcher shared across request handlers.
/// Clone is cheap - the source and cache are behind `Arc`.
#[derive(Clone)]
pub struct ResilientFetcher {
    source: Arc<dyn ContentSource>,
    cache: Arc<QueryCache>,
    backoff: Backoff,
}

impl ResilientFetcher {
    pub fn new(source: Arc<dyn ContentSource>, cache: Arc<QueryCache>) -> Self {
        Self {
            source,
            cache,
            backoff: Backoff::default(),
        }
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Run `query` with retry, timeout and caching per `options`.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        query: &str,
        params: &QueryParams,
        options: &FetchOptions,
    ) -> FetchOutcome<T> {
        let key = CacheKey::new(query, params);

        if options.cache {
            if let Some(cached) = self.cache.get(&key) {
                match serde_json::from_value::<T>(cached) {
                    Ok(value) => {
                        debug!("Cache hit for query");
                        return FetchOutcome::Found(value);
                    }
                    Err(e) => debug!(error = %e, "Cached value has a different shape, refetching"),
                }
            }
        }

        let attempts = options.retries.saturating_add(1);
        for attempt in 1..=attempts {
            debug!(attempt, attempts, "Content fetch attempt");

            match self.attempt(query, params, options.timeout).await {
                Ok(Value::Null) => {
                    debug!("Content query matched nothing");
                    return FetchOutcome::NotFound;
                }
                Ok(raw) => {
                    let value = match serde_json::from_value::<T>(raw.clone()) {
                        Ok(value) => value,
                        Err(e) => {
                            error!(error = %e, "Content query returned an unexpected shape");
                            return FetchOutcome::Unavailable;
                        }
                    };
                    if options.cache {
                        self.cache.insert(key, raw, options.cache_ttl);
                    }
                    return FetchOutcome::Found(value);
                }
                Err(e) => {
                    if attempt == attempts {
                        error!(error = %e, attempts, "All content fetch attempts failed");
                        return FetchOutcome::Unavailable;
                    }
                    let delay = self.backoff.delay(attempt);
                    warn!(error = %e, attempt, delay_ms = delay.as_millis() as u64, "Content fetch failed, backing off");
                    tokio::time::sleep(delay).await;
                }
            }
        }

        FetchOutcome::Unavailable
    }

    /// Warm the cache for `query` in the background.
    /// The result is discarded; failures are only logged.
    pub fn preload(&self, query: &'static str, params: QueryParams, options: FetchOptions) {
        let fetcher = self.clone();
        tokio::spawn(async move {
            let outcome: FetchOutcome<Value> = fetcher.fetch(query, &params, &options).await;
            if outcome.is_unavailable() {
                warn!("Failed to preload content query");
            }
        });
    }

    async fn attempt(&self, query: &str, params: &QueryParams, timeout: Duration) -> Result<Value, CmsError> {
        // The losing query future is dropped, which cancels the request
        match tokio::time::timeout(timeout, self.source.query(query, params)).await {
            Ok(result) => result,
            Err(_) => Err(CmsError::Timeout(timeout)),
        }
    }
}
