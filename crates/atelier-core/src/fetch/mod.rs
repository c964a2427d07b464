//! Resilient data fetching for content queries.
//!
//! `ResilientFetcher` wraps a `ContentSource` with a per-attempt timeout,
//! retry with backoff, and an in-memory TTL cache (`QueryCache`). Results
//! come back as a `FetchOutcome` so callers can tell "no such content"
//! apart from "content API unavailable".

pub mod cache;
pub mod resilient;

pub use cache::{CacheKey, QueryCache};
pub use resilient::{Backoff, FetchOptions, FetchOutcome, ResilientFetcher};
