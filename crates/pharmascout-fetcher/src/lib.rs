//! Content fetching for regulator sources.
//!
//! Defines the [`ContentFetcher`] boundary the discovery pipeline consumes,
//! the [`FetchError`] it reports, and an HTTP implementation with per-domain
//! politeness delays. Retry policy is not applied here.

pub mod error;
pub mod http;
pub mod url_builder;

pub use error::{FetchError, Result};
pub use http::HttpFetcher;
pub use url_builder::build_search_url;

use async_trait::async_trait;
use pharmascout_registry::SourceDefinition;
use std::time::Duration;

/// Returns raw page content for one page of a source's search results.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch result page `page` (1-based) of `source` for `query`.
    ///
    /// Must give up with [`FetchError::Timeout`] once `timeout` has elapsed.
    async fn fetch(
        &self,
        source: &SourceDefinition,
        query: &str,
        page: u32,
        timeout: Duration,
    ) -> Result<String>;
}
