//! Turning fetched content into candidate manufacturer records.
//!
//! Each [`SourceKind`] has its own [`ExtractionStrategy`]; the [`Extractor`]
//! picks one from its table by the kind of the source being read. Content
//! that cannot be parsed yields an empty [`Extraction`] with a warning, never
//! an error.

mod free_text;
mod json;
mod tabular;

pub use free_text::FreeTextStrategy;
pub use json::JsonRecordsStrategy;
pub use tabular::TabularStrategy;

use crate::records::CandidateRecord;
use pharmascout_core::{collapse_whitespace, ApiName};
use pharmascout_registry::{SourceDefinition, SourceKind};
use scraper::{Html, Selector};
use std::collections::HashMap;

/// What one page of content yielded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Manufacturer mentions found on the page
    pub candidates: Vec<CandidateRecord>,
    /// Set when the content could not be (fully) understood
    pub warning: Option<String>,
}

impl Extraction {
    /// An extraction that found nothing and has nothing to report.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// An extraction that could not read the content.
    #[must_use]
    pub fn unparseable(reason: impl Into<String>) -> Self {
        Self {
            candidates: Vec::new(),
            warning: Some(reason.into()),
        }
    }

    /// Found candidates, no warning.
    #[must_use]
    pub fn found(candidates: Vec<CandidateRecord>) -> Self {
        Self {
            candidates,
            warning: None,
        }
    }
}

/// Extraction logic for one kind of source content.
pub trait ExtractionStrategy: Send + Sync {
    /// Pull every mention of a manufacturer of `api_name` out of `content`.
    ///
    /// `source` is the registry source the content was fetched from; its
    /// canonical name is the fallback declared source.
    fn extract(&self, api_name: &ApiName, source: &SourceDefinition, content: &str) -> Extraction;
}

/// Strategy table keyed by source kind.
pub struct Extractor {
    strategies: HashMap<SourceKind, Box<dyn ExtractionStrategy>>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor {
    /// Extractor with the built-in strategy for every source kind.
    #[must_use]
    pub fn new() -> Self {
        let mut strategies: HashMap<SourceKind, Box<dyn ExtractionStrategy>> = HashMap::new();
        strategies.insert(SourceKind::TabularListing, Box::new(TabularStrategy));
        strategies.insert(SourceKind::FreeTextDocument, Box::new(FreeTextStrategy));
        strategies.insert(SourceKind::JsonRecords, Box::new(JsonRecordsStrategy));
        Self { strategies }
    }

    /// Replace the strategy used for `kind`.
    #[must_use]
    pub fn with_strategy(mut self, kind: SourceKind, strategy: Box<dyn ExtractionStrategy>) -> Self {
        self.strategies.insert(kind, strategy);
        self
    }

    /// Extract candidates from one page fetched from `source`.
    #[must_use]
    pub fn extract(&self, api_name: &ApiName, source: &SourceDefinition, content: &str) -> Extraction {
        if content.trim().is_empty() {
            return Extraction::unparseable("content is empty");
        }

        if looks_binary(content) {
            return Extraction::unparseable("content is not text");
        }

        match self.strategies.get(&source.kind()) {
            Some(strategy) => strategy.extract(api_name, source, content),
            None => Extraction::unparseable(format!(
                "no extraction strategy for {}",
                source.kind().display_name()
            )),
        }
    }
}

/// Control characters other than ordinary whitespace mean binary content.
fn looks_binary(content: &str) -> bool {
    content
        .chars()
        .take(4096)
        .any(|c| c.is_control() && !matches!(c, '\n' | '\r' | '\t' | '\u{c}'))
}

/// Trim, collapse whitespace and strip list punctuation from a field value.
pub(crate) fn clean_field(value: &str) -> Option<String> {
    let collapsed = collapse_whitespace(value);
    let cleaned = collapsed
        .trim_matches(|c: char| matches!(c, ',' | ';' | ':' | '|' | '-') || c.is_whitespace())
        .to_string();

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Whether a product field names something other than the searched ingredient.
pub(crate) fn names_other_product(api_name: &ApiName, product: Option<&str>) -> bool {
    product.is_some_and(|product| !api_name.is_mentioned_in(product))
}

/// `<meta name="publisher" content="...">` of an HTML page, if any.
pub(crate) fn page_publisher(document: &Html) -> Option<String> {
    let selector = Selector::parse(r#"meta[name="publisher"]"#).ok()?;
    document
        .select(&selector)
        .find_map(|meta| meta.value().attr("content"))
        .and_then(clean_field)
}

/// Record-level attribution, then page-level, then the fetching source.
pub(crate) fn declared_source(
    record_level: Option<String>,
    page_level: Option<&str>,
    source: &SourceDefinition,
) -> String {
    record_level
        .or_else(|| page_level.map(str::to_string))
        .unwrap_or_else(|| source.name().to_string())
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDate;
    use pharmascout_core::SourceId;
    use pharmascout_registry::{SearchConfig, SourceDefinition, SourceKind, SourceMetadata};

    pub fn source(kind: SourceKind) -> SourceDefinition {
        SourceDefinition {
            source: SourceMetadata {
                id: SourceId::new("in-cdsco").expect("valid source ID"),
                name: "CDSCO".to_string(),
                aliases: vec!["Central Drugs Standard Control Organisation".to_string()],
                locale: "en-IN".to_string(),
                kind,
                listing_order: 0,
                enabled: true,
                last_verified: NaiveDate::from_ymd_opt(2025, 5, 1).expect("valid date"),
            },
            search: SearchConfig {
                url_pattern: "https://cdsco.gov.in/search?q={query}".to_string(),
                max_pages: 1,
            },
        }
    }
}
