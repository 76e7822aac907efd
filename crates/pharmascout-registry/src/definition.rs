//! Source definition types and structures.
//!
//! This module defines the data structures for regulator source definitions
//! loaded from TOML files.

use crate::error::{RegistryError, Result};
use chrono::NaiveDate;
use pharmascout_core::SourceId;
use serde::{Deserialize, Serialize};
use url::Url;

/// Upper bound on result pages fetched per source and run.
pub const MAX_PAGES_LIMIT: u32 = 20;

/// Complete source definition loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDefinition {
    /// Core source metadata
    pub source: SourceMetadata,

    /// Search configuration
    pub search: SearchConfig,
}

impl SourceDefinition {
    /// Get the source ID.
    #[must_use]
    pub fn id(&self) -> &SourceId {
        &self.source.id
    }

    /// Get the canonical agency name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.source.name
    }

    /// Get the content kind, which selects the extraction strategy.
    #[must_use]
    pub fn kind(&self) -> SourceKind {
        self.source.kind
    }

    /// Get the locale the source publishes in (e.g. `en-IN`).
    #[must_use]
    pub fn locale(&self) -> &str {
        &self.source.locale
    }

    /// Get the search URL pattern.
    #[must_use]
    pub fn url_pattern(&self) -> &str {
        &self.search.url_pattern
    }

    /// Host name of the search URL, lowercased.
    #[must_use]
    pub fn host(&self) -> Option<String> {
        Url::parse(&sample_url(&self.search.url_pattern))
            .ok()
            .and_then(|url| url.host_str().map(str::to_lowercase))
    }

    /// Validate the source definition for completeness and correctness.
    pub fn validate(&self) -> Result<()> {
        if self.source.name.trim().is_empty() {
            return Err(self.invalid("source name cannot be empty"));
        }

        if self.source.locale.trim().is_empty() {
            return Err(self.invalid("source locale cannot be empty"));
        }

        if self.source.aliases.iter().any(|alias| alias.trim().is_empty()) {
            return Err(self.invalid("source aliases cannot be empty strings"));
        }

        self.search.validate(&self.source.id)
    }

    fn invalid(&self, reason: &str) -> RegistryError {
        RegistryError::ValidationError {
            source_id: self.source.id.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Core source metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// Unique source identifier (e.g., "us-fda", "in-cdsco")
    pub id: SourceId,

    /// Canonical agency name; this is what persisted records carry
    pub name: String,

    /// Other official names the agency is cited under
    #[serde(default)]
    pub aliases: Vec<String>,

    /// Locale of the published content (BCP 47 tag)
    pub locale: String,

    /// Shape of the content the source publishes
    pub kind: SourceKind,

    /// Position in the registry listing; lower values come first
    #[serde(default)]
    pub listing_order: u32,

    /// Retired sources are kept on disk with `enabled = false`
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Date when this definition was last verified (YYYY-MM-DD)
    pub last_verified: NaiveDate,
}

fn default_enabled() -> bool {
    true
}

/// Shape of the content a source publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// HTML registry listing with one manufacturer per table row
    TabularListing,
    /// Free-text documents (assessment reports, notices, certificates)
    FreeTextDocument,
    /// JSON records from a public API
    JsonRecords,
}

impl SourceKind {
    /// Get a human-readable display name.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::TabularListing => "Tabular Listing",
            Self::FreeTextDocument => "Free-Text Document",
            Self::JsonRecords => "JSON Records",
        }
    }
}

/// How a source is searched for an ingredient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// URL pattern with `{query}` and optional `{page}` placeholders
    pub url_pattern: String,

    /// Number of result pages to walk per run
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

fn default_max_pages() -> u32 {
    1
}

impl SearchConfig {
    fn validate(&self, source_id: &SourceId) -> Result<()> {
        let invalid = |reason: String| RegistryError::ValidationError {
            source_id: source_id.to_string(),
            reason,
        };

        if !self.url_pattern.contains("{query}") {
            return Err(invalid(
                "url_pattern must contain a {query} placeholder".to_string(),
            ));
        }

        let url = Url::parse(&sample_url(&self.url_pattern))
            .map_err(|e| invalid(format!("url_pattern is not a valid URL: {e}")))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(invalid(format!(
                "url_pattern must use http or https, got {}",
                url.scheme()
            )));
        }

        if url.host_str().is_none() {
            return Err(invalid("url_pattern has no host".to_string()));
        }

        if self.max_pages == 0 || self.max_pages > MAX_PAGES_LIMIT {
            return Err(invalid(format!(
                "max_pages must be 1-{MAX_PAGES_LIMIT}, got {}",
                self.max_pages
            )));
        }

        Ok(())
    }
}

/// Fill the placeholders with inert values so the pattern can be parsed.
fn sample_url(pattern: &str) -> String {
    pattern.replace("{query}", "q").replace("{page}", "1")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(url_pattern: &str, max_pages: u32) -> SourceDefinition {
        SourceDefinition {
            source: SourceMetadata {
                id: SourceId::new("in-cdsco").expect("valid source ID"),
                name: "CDSCO".to_string(),
                aliases: vec!["Central Drugs Standard Control Organisation".to_string()],
                locale: "en-IN".to_string(),
                kind: SourceKind::TabularListing,
                listing_order: 1,
                enabled: true,
                last_verified: NaiveDate::from_ymd_opt(2025, 5, 1).expect("valid date"),
            },
            search: SearchConfig {
                url_pattern: url_pattern.to_string(),
                max_pages,
            },
        }
    }

    #[test]
    fn test_valid_definition() {
        let def = definition("https://cdsco.gov.in/search?drug={query}&page={page}", 3);
        def.validate().expect("definition is valid");
        assert_eq!(def.host().as_deref(), Some("cdsco.gov.in"));
    }

    #[test]
    fn test_missing_query_placeholder() {
        let def = definition("https://cdsco.gov.in/search", 1);
        let err = def.validate().expect_err("missing placeholder");
        assert!(err.to_string().contains("{query}"));
    }

    #[test]
    fn test_non_http_scheme_rejected() {
        let def = definition("ftp://cdsco.gov.in/{query}", 1);
        assert!(def.validate().is_err());
    }

    #[test]
    fn test_max_pages_bounds() {
        assert!(definition("https://cdsco.gov.in/?q={query}", 0)
            .validate()
            .is_err());
        assert!(definition("https://cdsco.gov.in/?q={query}", MAX_PAGES_LIMIT + 1)
            .validate()
            .is_err());
    }

    #[test]
    fn test_blank_name_rejected() {
        let mut def = definition("https://cdsco.gov.in/?q={query}", 1);
        def.source.name = "  ".to_string();
        assert!(matches!(
            def.validate(),
            Err(RegistryError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_parse_toml_defaults() {
        let toml_str = r#"
[source]
id = "eu-ema"
name = "EMA"
locale = "en-GB"
kind = "free-text-document"
last_verified = "2025-04-12"

[search]
url_pattern = "https://www.ema.europa.eu/en/search?search_api_fulltext={query}"
"#;

        let def: SourceDefinition = toml::from_str(toml_str).expect("parse definition");
        assert_eq!(def.kind(), SourceKind::FreeTextDocument);
        assert!(def.source.enabled);
        assert!(def.source.aliases.is_empty());
        assert_eq!(def.search.max_pages, 1);
        assert_eq!(def.source.listing_order, 0);
    }
}
