//! Regulator-only provenance enforcement.
//!
//! A candidate survives only when its declared source resolves to a member of
//! the [`SourceRegistry`]. Everything else is a [`Rejection`], which callers
//! count and log but never raise.

use crate::records::{CandidateRecord, ValidatedRecord};
use pharmascout_core::collapse_whitespace;
use pharmascout_registry::SourceRegistry;
use std::sync::Arc;
use thiserror::Error;

/// Why a candidate was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// A required name field was blank.
    #[error("missing {field}")]
    MissingField {
        /// Which field was blank
        field: &'static str,
    },

    /// The declared source is not a trusted regulator.
    #[error("unresolved source: {declared:?}")]
    UnresolvedSource {
        /// The declared source as extracted
        declared: String,
    },
}

/// Checks candidates against the registry.
#[derive(Debug, Clone)]
pub struct ProvenanceValidator {
    registry: Arc<SourceRegistry>,
}

impl ProvenanceValidator {
    /// Create a validator backed by `registry`.
    #[must_use]
    pub fn new(registry: Arc<SourceRegistry>) -> Self {
        Self { registry }
    }

    /// Validate a candidate produced by the source at `registry_index`.
    ///
    /// Name fields are whitespace-collapsed; the resolved source's canonical
    /// name becomes the record's `source_name`.
    pub fn validate(
        &self,
        candidate: CandidateRecord,
        registry_index: usize,
    ) -> Result<ValidatedRecord, Rejection> {
        let api_name = collapse_whitespace(&candidate.api_name);
        if api_name.is_empty() {
            return Err(Rejection::MissingField { field: "api_name" });
        }

        let manufacturer_name = collapse_whitespace(&candidate.manufacturer_name);
        if manufacturer_name.is_empty() {
            return Err(Rejection::MissingField {
                field: "manufacturer_name",
            });
        }

        let Some(source) = self.registry.resolve(&candidate.declared_source) else {
            return Err(Rejection::UnresolvedSource {
                declared: candidate.declared_source,
            });
        };
        let source_name = source.name().to_string();

        Ok(ValidatedRecord {
            candidate: CandidateRecord {
                api_name,
                manufacturer_name,
                ..candidate
            },
            source_name,
            registry_index,
        })
    }
}
