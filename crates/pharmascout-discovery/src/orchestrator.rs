//! Discovery orchestrator for coordinating one ingredient search.
//!
//! This module provides the `DiscoveryOrchestrator` which fans a search out
//! over every registry source, funnels the results through extraction and
//! provenance validation, and commits the reconciled new records in one
//! store transaction.

use crate::error::{DiscoveryError, Result};
use crate::extractor::Extractor;
use crate::reconciler::reconcile;
use crate::records::ValidatedRecord;
use crate::validator::ProvenanceValidator;
use futures::stream::{FuturesUnordered, StreamExt};
use pharmascout_core::{ApiName, DiscoveryConfig};
use pharmascout_db::ManufacturerStore;
use pharmascout_fetcher::ContentFetcher;
use pharmascout_registry::{SourceDefinition, SourceRegistry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Error recorded for a source whose work was cut off by the run deadline.
pub const DEADLINE_EXCEEDED: &str = "deadline exceeded";

/// Summary of one discovery run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryRunResult {
    /// Ingredient that was searched for
    pub api_name: String,
    /// Records committed to the store
    pub inserted_count: usize,
    /// Records dropped as already stored or repeated within the run
    pub duplicate_count: usize,
    /// Candidates that failed provenance validation
    pub rejected_count: usize,
    /// Source name to failure description, for sources that failed
    pub per_source_errors: BTreeMap<String, String>,
    /// Number of registry sources the run covered
    pub sources_queried: usize,
}

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Nothing started yet
    Idle,
    /// Fetching pages of the source at this registry index
    FetchingSource(usize),
    /// Turning fetched content into candidates
    Extracting,
    /// Checking candidate provenance
    Validating,
    /// Comparing against the store
    Reconciling,
    /// Committing new records
    Persisting,
    /// Result available
    Done,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::FetchingSource(index) => write!(f, "fetching source #{index}"),
            Self::Extracting => write!(f, "extracting"),
            Self::Validating => write!(f, "validating"),
            Self::Reconciling => write!(f, "reconciling"),
            Self::Persisting => write!(f, "persisting"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// What one source contributed to a run.
#[derive(Debug)]
struct SourceOutcome {
    registry_index: usize,
    source_name: String,
    validated: Vec<ValidatedRecord>,
    rejected: usize,
    error: Option<String>,
}

/// Orchestrates discovery runs across the source registry.
pub struct DiscoveryOrchestrator {
    registry: Arc<SourceRegistry>,
    fetcher: Arc<dyn ContentFetcher>,
    store: Arc<dyn ManufacturerStore>,
    extractor: Arc<Extractor>,
    validator: ProvenanceValidator,
    config: DiscoveryConfig,
}

impl DiscoveryOrchestrator {
    /// Create a new orchestrator with default discovery settings.
    #[must_use]
    pub fn new(
        registry: Arc<SourceRegistry>,
        fetcher: Arc<dyn ContentFetcher>,
        store: Arc<dyn ManufacturerStore>,
    ) -> Self {
        Self {
            validator: ProvenanceValidator::new(Arc::clone(&registry)),
            registry,
            fetcher,
            store,
            extractor: Arc::new(Extractor::new()),
            config: DiscoveryConfig::default(),
        }
    }

    /// Use the given `[discovery]` settings.
    #[must_use]
    pub fn with_config(mut self, config: DiscoveryConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a custom extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    /// Discover manufacturers of `api_name` and persist the new ones.
    ///
    /// Source failures are reported in the result, not raised. The run stops
    /// collecting at `deadline` and reconciles whatever it has by then.
    ///
    /// # Errors
    /// Fails without a result when the API name is blank, the registry is
    /// empty, or the store cannot be read or written.
    pub async fn run_discovery(&self, api_name: &str, deadline: Instant) -> Result<DiscoveryRunResult> {
        let api = ApiName::new(api_name).map_err(|e| DiscoveryError::InvalidApiName(e.to_string()))?;

        if self.registry.is_empty() {
            return Err(DiscoveryError::EmptyRegistry);
        }

        Self::enter(&api, RunPhase::Idle);

        let max_concurrent = self.config.max_concurrent_sources.max(1);
        let mut futures = FuturesUnordered::new();
        let mut outcomes = Vec::with_capacity(self.registry.len());

        for (index, source) in self.registry.list_sources().iter().enumerate() {
            futures.push(self.collect_source(index, source, &api, deadline));

            // Respect concurrency limit
            while futures.len() >= max_concurrent {
                if let Some(outcome) = futures.next().await {
                    outcomes.push(outcome);
                }
            }
        }

        while let Some(outcome) = futures.next().await {
            outcomes.push(outcome);
        }

        // Completion order is arbitrary; registry order decides from here on.
        outcomes.sort_by_key(|outcome| outcome.registry_index);

        let mut validated = Vec::new();
        let mut rejected_count = 0;
        let mut per_source_errors = BTreeMap::new();

        for outcome in outcomes {
            rejected_count += outcome.rejected;
            validated.extend(outcome.validated);
            if let Some(error) = outcome.error {
                per_source_errors.insert(outcome.source_name, error);
            }
        }

        Self::enter(&api, RunPhase::Reconciling);
        let existing = self.store.query_by_api_name(api.as_str()).await?;
        let plan = reconcile(validated, &existing);
        let duplicate_count = plan.to_skip.len();

        Self::enter(&api, RunPhase::Persisting);
        let inserted = self
            .store
            .insert_batch(
                plan.to_insert
                    .into_iter()
                    .map(ValidatedRecord::into_new_record)
                    .collect(),
            )
            .await?;

        Self::enter(&api, RunPhase::Done);

        let result = DiscoveryRunResult {
            api_name: api.to_string(),
            inserted_count: inserted.len(),
            duplicate_count,
            rejected_count,
            per_source_errors,
            sources_queried: self.registry.len(),
        };

        info!(
            api = %result.api_name,
            inserted = result.inserted_count,
            duplicates = result.duplicate_count,
            rejected = result.rejected_count,
            failed_sources = result.per_source_errors.len(),
            "discovery run complete"
        );

        Ok(result)
    }

    /// Fetch, extract and validate every page of one source.
    ///
    /// Never fails: fetch errors and extraction warnings end the source and
    /// are carried in the outcome alongside whatever earlier pages produced.
    async fn collect_source(
        &self,
        index: usize,
        source: &SourceDefinition,
        api: &ApiName,
        deadline: Instant,
    ) -> SourceOutcome {
        let mut outcome = SourceOutcome {
            registry_index: index,
            source_name: source.name().to_string(),
            validated: Vec::new(),
            rejected: 0,
            error: None,
        };

        for page in 1..=source.search.max_pages {
            Self::enter(api, RunPhase::FetchingSource(index));
            let content = match self.fetch_with_retry(source, api, page, deadline).await {
                Ok(content) => content,
                Err(error) => {
                    warn!(source = %source.name(), page, error = %error, "source fetch failed");
                    outcome.error = Some(error);
                    break;
                }
            };

            Self::enter(api, RunPhase::Extracting);
            let extraction = self.extractor.extract(api, source, &content);
            let found = extraction.candidates.len();

            Self::enter(api, RunPhase::Validating);
            for candidate in extraction.candidates {
                match self.validator.validate(candidate, index) {
                    Ok(record) => outcome.validated.push(record),
                    Err(rejection) => {
                        debug!(source = %source.name(), reason = %rejection, "candidate rejected");
                        outcome.rejected += 1;
                    }
                }
            }

            if let Some(warning) = extraction.warning {
                warn!(source = %source.name(), page, warning = %warning, "extraction warning");
                outcome.error = Some(warning);
                break;
            }

            if found == 0 {
                break;
            }
        }

        outcome
    }

    /// Fetch one page, retrying transient errors with linear backoff.
    async fn fetch_with_retry(
        &self,
        source: &SourceDefinition,
        api: &ApiName,
        page: u32,
        deadline: Instant,
    ) -> std::result::Result<String, String> {
        let timeout = self.config.fetch_timeout();
        let mut attempt = 0;

        loop {
            let fetched = tokio::time::timeout_at(
                deadline,
                self.fetcher.fetch(source, api.as_str(), page, timeout),
            )
            .await;

            match fetched {
                Err(_) => return Err(DEADLINE_EXCEEDED.to_string()),
                Ok(Ok(content)) => return Ok(content),
                Ok(Err(e)) if e.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let delay = Duration::from_millis(self.config.retry_delay_ms * u64::from(attempt));

                    warn!(
                        source = %source.name(),
                        page,
                        attempt,
                        max_retries = self.config.max_retries,
                        error = %e,
                        "fetch failed, retrying in {:?}",
                        delay
                    );

                    if tokio::time::timeout_at(deadline, tokio::time::sleep(delay))
                        .await
                        .is_err()
                    {
                        return Err(DEADLINE_EXCEEDED.to_string());
                    }
                }
                Ok(Err(e)) => return Err(e.to_string()),
            }
        }
    }

    fn enter(api: &ApiName, phase: RunPhase) {
        debug!(api = %api, phase = %phase, "discovery phase");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display() {
        assert_eq!(RunPhase::FetchingSource(2).to_string(), "fetching source #2");
        assert_eq!(RunPhase::Done.to_string(), "done");
    }

    #[test]
    fn test_result_serializes_errors_in_order() {
        let mut per_source_errors = BTreeMap::new();
        per_source_errors.insert("source3".to_string(), "HTTP 503".to_string());
        per_source_errors.insert("source2".to_string(), "timeout".to_string());

        let result = DiscoveryRunResult {
            api_name: "Paracetamol".to_string(),
            inserted_count: 2,
            duplicate_count: 0,
            rejected_count: 1,
            per_source_errors,
            sources_queried: 3,
        };

        let json = serde_json::to_string(&result).expect("serialize result");
        let source2 = json.find("source2").expect("source2 present");
        let source3 = json.find("source3").expect("source3 present");
        assert!(source2 < source3);
        assert!(json.contains(r#""inserted_count":2"#));
    }
}
