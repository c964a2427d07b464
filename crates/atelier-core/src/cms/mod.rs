//! Content API client module for the headless CMS.
//!
//! This module provides the `CmsClient` for running GROQ queries against
//! the Sanity HTTP query API, and the `ContentSource` trait that the
//! resilient fetch layer is written against.

pub mod client;
pub mod error;
pub mod queries;

pub use client::{CmsClient, ContentSource, QueryParams};
pub use error::CmsError;
