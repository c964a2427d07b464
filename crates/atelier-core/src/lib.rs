//! Core library for the atelier portfolio site.
//!
//! - `cms`: content API client and GROQ queries
//! - `fetch`: retry/timeout/TTL-cache wrapper around content queries
//! - `navigation`: gallery position and focus restoration over session storage
//! - `rate_limit`: fixed-window request throttling per client
//! - `indexnow`: search engine URL submission
//! - `contact`: contact form validation and mail delivery
//! - `device`, `gesture`: viewport classification and swipe detection

pub mod cms;
pub mod config;
pub mod contact;
pub mod device;
pub mod fetch;
pub mod gesture;
pub mod indexnow;
pub mod models;
pub mod navigation;
pub mod rate_limit;

pub use cms::{CmsClient, CmsError, ContentSource, QueryParams};
pub use config::Config;
pub use contact::{ContactForm, Mailer, ResendMailer};
pub use fetch::{FetchOptions, FetchOutcome, QueryCache, ResilientFetcher};
pub use indexnow::{IndexNowClient, IndexNowError, IndexNowRequest, IndexNowSummary};
pub use navigation::{restore_position, MemoryStorage, ScrollManager, SessionStorage};
pub use rate_limit::{RateLimitDecision, RateLimiter};
