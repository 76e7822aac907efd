use crate::error::{FetchError, Result};
use crate::url_builder::build_search_url;
use crate::ContentFetcher;
use async_trait::async_trait;
use pharmascout_core::FetcherConfig;
use pharmascout_registry::SourceDefinition;
use reqwest::header::{ACCEPT_LANGUAGE, HeaderValue};
use reqwest::StatusCode;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Per-domain politeness delay.
///
/// Requests to the same domain are spaced at least `min_delay` apart; callers
/// wait for their slot instead of failing.
#[derive(Debug)]
struct RateLimiter {
    next_slot: Mutex<HashMap<String, Instant>>,
    min_delay: Duration,
}

impl RateLimiter {
    fn new(min_delay_ms: u64) -> Self {
        Self {
            next_slot: Mutex::new(HashMap::new()),
            min_delay: Duration::from_millis(min_delay_ms),
        }
    }

    /// Reserve the next slot for `domain` and sleep until it opens.
    /// Returns how long the caller waited.
    async fn acquire(&self, domain: &str) -> Duration {
        let wait = {
            let mut slots = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = slots
                .get(domain)
                .copied()
                .filter(|slot| *slot > now)
                .unwrap_or(now);
            slots.insert(domain.to_string(), slot + self.min_delay);
            slot.saturating_duration_since(now)
        };

        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
        wait
    }
}

/// [`ContentFetcher`] backed by a shared reqwest client.
pub struct HttpFetcher {
    client: reqwest::Client,
    rate_limiter: RateLimiter,
}

impl HttpFetcher {
    /// Build a fetcher from the `[fetcher]` configuration section.
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            rate_limiter: RateLimiter::new(config.min_domain_delay_ms),
        })
    }

    async fn fetch_page(&self, source: &SourceDefinition, domain: String, url: &str) -> Result<String> {
        let mut request = self.client.get(url);
        if let Ok(locale) = HeaderValue::from_str(source.locale()) {
            request = request.header(ACCEPT_LANGUAGE, locale);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited { domain });
        }
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch(
        &self,
        source: &SourceDefinition,
        query: &str,
        page: u32,
        timeout: Duration,
    ) -> Result<String> {
        let url = build_search_url(&source.search, query, page)?;

        // The politeness wait is not part of the request timeout.
        let domain = source.host().unwrap_or_default();
        let waited = self.rate_limiter.acquire(&domain).await;

        debug!(
            source_id = %source.id(),
            url = %url,
            waited_ms = waited.as_millis(),
            "fetching source page"
        );

        tokio::time::timeout(timeout, self.fetch_page(source, domain, &url))
            .await
            .map_err(|_| FetchError::Timeout)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pharmascout_core::SourceId;
    use pharmascout_registry::{SearchConfig, SourceKind, SourceMetadata};

    #[tokio::test]
    async fn test_rate_limiter_spaces_same_domain() {
        let limiter = RateLimiter::new(100);

        let first = limiter.acquire("cdsco.gov.in").await;
        assert!(first.is_zero());

        let started = Instant::now();
        limiter.acquire("cdsco.gov.in").await;
        assert!(started.elapsed() >= Duration::from_millis(90));
    }

    #[tokio::test]
    async fn test_rate_limiter_different_domains() {
        let limiter = RateLimiter::new(100);

        assert!(limiter.acquire("cdsco.gov.in").await.is_zero());
        assert!(limiter.acquire("www.ema.europa.eu").await.is_zero());
    }

    #[tokio::test]
    async fn test_rate_limiter_zero_delay() {
        let limiter = RateLimiter::new(0);

        assert!(limiter.acquire("api.fda.gov").await.is_zero());
        assert!(limiter.acquire("api.fda.gov").await.is_zero());
    }

    fn source_with_pattern(url_pattern: &str) -> SourceDefinition {
        SourceDefinition {
            source: SourceMetadata {
                id: SourceId::new("local-source").expect("valid source ID"),
                name: "Local".to_string(),
                aliases: Vec::new(),
                locale: "en".to_string(),
                kind: SourceKind::JsonRecords,
                listing_order: 0,
                enabled: true,
                last_verified: NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date"),
            },
            search: SearchConfig {
                url_pattern: url_pattern.to_string(),
                max_pages: 1,
            },
        }
    }

    #[tokio::test]
    async fn test_politeness_wait_not_counted_in_timeout() {
        // Accepts connections but never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind listener");
        let port = listener.local_addr().expect("local addr").port();
        let accepted = tokio::spawn(async move { listener.accept().await.map(|(stream, _)| stream) });

        let config = FetcherConfig {
            min_domain_delay_ms: 300,
            ..FetcherConfig::default()
        };
        let fetcher = HttpFetcher::new(&config).expect("build fetcher");
        let source = source_with_pattern(&format!("http://127.0.0.1:{port}/search?q={{query}}"));

        // Another request already holds the current slot for this domain
        fetcher.rate_limiter.acquire("127.0.0.1").await;

        let started = Instant::now();
        let result = fetcher
            .fetch(&source, "ibuprofen", 1, Duration::from_millis(100))
            .await;

        assert_eq!(result, Err(FetchError::Timeout));
        assert!(started.elapsed() >= Duration::from_millis(300));

        let connection = tokio::time::timeout(Duration::from_secs(1), accepted)
            .await
            .expect("request was sent after the wait")
            .expect("accept task");
        assert!(connection.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_url_fails_before_request() {
        let fetcher = HttpFetcher::new(&FetcherConfig::default()).expect("build fetcher");
        let source = source_with_pattern("{query}");

        let result = fetcher
            .fetch(&source, "ibuprofen", 1, Duration::from_secs(1))
            .await;
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    }
}
