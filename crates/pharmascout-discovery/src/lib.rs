//! PharmaScout Discovery - the manufacturer discovery pipeline.
//!
//! This crate turns a single ingredient name into new, provenance-checked
//! manufacturer records. It coordinates the content fetcher, per-kind
//! extraction, regulator-only validation, deduplication and persistence.
//!
//! # Features
//!
//! - Concurrent fetching of registry sources with a configurable limit
//! - Retry logic with linear backoff for transient fetch failures
//! - Whole-run deadline with partial results
//! - Strict provenance: only registry regulators are ever persisted
//! - Idempotent runs backed by a single store transaction
//!
//! # Example
//!
//! ```rust,ignore
//! use pharmascout_discovery::DiscoveryOrchestrator;
//! use std::sync::Arc;
//! use tokio::time::{Duration, Instant};
//!
//! let orchestrator = DiscoveryOrchestrator::new(
//!     Arc::new(registry),
//!     Arc::new(http_fetcher),
//!     Arc::new(database),
//! );
//!
//! let result = orchestrator
//!     .run_discovery("Paracetamol", Instant::now() + Duration::from_secs(120))
//!     .await?;
//! println!("{} new manufacturers", result.inserted_count);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

#[allow(missing_docs)]
pub mod error;
pub mod extractor;
pub mod orchestrator;
pub mod reconciler;
pub mod records;
pub mod validator;

// Re-export commonly used types
pub use error::{DiscoveryError, Result};
pub use extractor::{Extraction, ExtractionStrategy, Extractor};
pub use orchestrator::{DiscoveryOrchestrator, DiscoveryRunResult, RunPhase, DEADLINE_EXCEEDED};
pub use reconciler::{reconcile, ReconcilePlan};
pub use records::{CandidateRecord, ValidatedRecord};
pub use validator::{ProvenanceValidator, Rejection};
