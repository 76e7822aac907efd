//! Ordered, read-only registry of trusted regulatory sources.
//!
//! The registry is built once at process start and shared by reference
//! (`Arc<SourceRegistry>`). It never changes afterwards.

use crate::{
    definition::SourceDefinition,
    error::{RegistryError, Result},
    loader::SourceLoader,
};
use pharmascout_core::{normalize_key, SourceId};
use std::collections::HashMap;
use tracing::{debug, info};
use url::Url;

/// Attribution text containing any of these tokens came from a general web
/// search, never from a regulator.
const WEB_SEARCH_MARKERS: &[&str] = &[
    "google",
    "bing",
    "duckduckgo",
    "yahoo",
    "yandex",
    "baidu",
    "web search",
    "search engine",
    "search result",
    "search results",
];

/// Lowercased names a source may be cited under.
#[derive(Debug, Clone)]
struct SourceMatcher {
    /// Canonical name and aliases, normalized
    names: Vec<String>,
    /// Host of the search URL, without a leading `www.`
    host: Option<String>,
}

impl SourceMatcher {
    fn for_definition(definition: &SourceDefinition) -> Self {
        let names = std::iter::once(definition.name())
            .chain(definition.source.aliases.iter().map(String::as_str))
            .map(normalize_key)
            .collect();

        let host = definition
            .host()
            .map(|host| host.strip_prefix("www.").map_or(host.clone(), str::to_string));

        Self { names, host }
    }

    fn equals(&self, declared: &str) -> bool {
        self.names.iter().any(|name| name == declared)
    }

    /// Length of the longest name or host this source is cited by, if any.
    fn longest_mention(&self, attribution: &Attribution) -> Option<usize> {
        let by_name = self
            .names
            .iter()
            .filter(|name| contains_token(&attribution.prose, name))
            .map(String::len)
            .max();

        let by_host = self
            .host
            .as_ref()
            .filter(|host| {
                attribution
                    .domains
                    .iter()
                    .any(|domain| is_same_or_subdomain(domain, host))
            })
            .map(String::len);

        by_name.max(by_host)
    }
}

/// Declared source text split into web domains and the remaining prose.
///
/// Names are only matched in the prose, so a registry name embedded in
/// someone else's domain or URL never counts.
#[derive(Debug, Default)]
struct Attribution {
    prose: String,
    domains: Vec<String>,
}

impl Attribution {
    fn parse(declared: &str) -> Self {
        let mut attribution = Self::default();
        let mut prose = Vec::new();

        for word in declared.split_whitespace() {
            match domain_of(word) {
                Some(domain) => {
                    attribution.domains.push(domain);
                    prose.push("|");
                }
                None => prose.push(word),
            }
        }

        attribution.prose = prose.join(" ");
        attribution
    }
}

/// Host of a word that is a URL or a bare domain (`cdsco.gov.in/listing`).
///
/// A URL that does not parse yields an empty host, which matches nothing.
fn domain_of(word: &str) -> Option<String> {
    let word = word.trim_matches(|c: char| {
        matches!(c, '(' | ')' | '[' | ']' | '<' | '>' | '"' | '\'' | ',' | ';' | '.')
    });

    if word.contains("://") {
        return Some(
            Url::parse(word)
                .ok()
                .and_then(|url| url.host_str().map(str::to_lowercase))
                .unwrap_or_default(),
        );
    }

    let url = Url::parse(&format!("http://{word}")).ok()?;
    let host = url.host_str()?.to_lowercase();
    looks_like_host(&host).then_some(host)
}

/// Dotted name ending in an alphabetic label of two or more letters, so
/// abbreviations like "u.s" are not taken for domains.
fn looks_like_host(host: &str) -> bool {
    let labels: Vec<&str> = host.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| !label.is_empty())
        && labels
            .last()
            .is_some_and(|tld| tld.len() >= 2 && tld.chars().all(char::is_alphabetic))
}

fn is_same_or_subdomain(domain: &str, host: &str) -> bool {
    domain == host
        || domain
            .strip_suffix(host)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Immutable registry of trusted sources, in listing order.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<SourceDefinition>,
    matchers: Vec<SourceMatcher>,
    by_id: HashMap<SourceId, usize>,
    by_name: HashMap<String, usize>,
}

impl SourceRegistry {
    /// Build a registry from definitions.
    ///
    /// Disabled (retired) definitions are left out. The rest are ordered by
    /// `listing_order`; ties keep their input order.
    ///
    /// # Errors
    /// Returns error if a definition is invalid or two enabled definitions
    /// share an ID or a case-insensitive name.
    pub fn from_definitions(definitions: Vec<SourceDefinition>) -> Result<Self> {
        let mut enabled = Vec::with_capacity(definitions.len());

        for definition in definitions {
            definition.validate()?;
            if definition.source.enabled {
                enabled.push(definition);
            } else {
                debug!(source_id = %definition.id(), "skipping retired source");
            }
        }

        enabled.sort_by_key(|definition| definition.source.listing_order);

        let mut registry = Self::default();

        for (index, definition) in enabled.into_iter().enumerate() {
            if registry.by_id.insert(definition.id().clone(), index).is_some() {
                return Err(RegistryError::DuplicateSource {
                    name: definition.id().to_string(),
                });
            }

            if registry
                .by_name
                .insert(normalize_key(definition.name()), index)
                .is_some()
            {
                return Err(RegistryError::DuplicateSource {
                    name: definition.name().to_string(),
                });
            }

            registry
                .matchers
                .push(SourceMatcher::for_definition(&definition));
            registry.sources.push(definition);
        }

        Ok(registry)
    }

    /// Create a registry from every definition the loader finds.
    ///
    /// # Errors
    /// Returns error if loading fails or the definitions conflict.
    pub fn load_from(loader: &SourceLoader) -> Result<Self> {
        let registry = Self::from_definitions(loader.load_all()?)?;
        info!(count = registry.len(), "source registry ready");
        Ok(registry)
    }

    /// All enabled sources in listing order.
    #[must_use]
    pub fn list_sources(&self) -> &[SourceDefinition] {
        &self.sources
    }

    /// Resolve free-text attribution to a registry source.
    ///
    /// Matches a canonical name or alias exactly (case-insensitive), a name
    /// or alias appearing as a whole token in the prose, or a URL or domain
    /// whose host is the source's host or one of its subdomains. Text
    /// carrying a web-search marker never resolves. When several sources
    /// match, the longest matched name or host wins; listing order breaks
    /// ties.
    #[must_use]
    pub fn resolve(&self, declared: &str) -> Option<&SourceDefinition> {
        let declared = normalize_key(declared);

        if declared.is_empty() {
            return None;
        }

        if WEB_SEARCH_MARKERS
            .iter()
            .any(|marker| contains_token(&declared, marker))
        {
            return None;
        }

        if let Some(&index) = self.by_name.get(&declared) {
            return Some(&self.sources[index]);
        }

        if let Some(index) = self.matchers.iter().position(|matcher| matcher.equals(&declared)) {
            return Some(&self.sources[index]);
        }

        let attribution = Attribution::parse(&declared);
        let (_, index) = self
            .matchers
            .iter()
            .enumerate()
            .filter_map(|(index, matcher)| {
                matcher
                    .longest_mention(&attribution)
                    .map(|len| (len, index))
            })
            .max_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)))?;

        Some(&self.sources[index])
    }

    /// Get a source by ID.
    ///
    /// # Errors
    /// Returns error if the source is not in the registry.
    pub fn get(&self, source_id: &SourceId) -> Result<&SourceDefinition> {
        self.by_id
            .get(source_id)
            .map(|&index| &self.sources[index])
            .ok_or_else(|| RegistryError::NotFound {
                source_id: source_id.to_string(),
            })
    }

    /// Look up a source by canonical name (case-insensitive).
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&SourceDefinition> {
        self.by_name
            .get(&normalize_key(name))
            .map(|&index| &self.sources[index])
    }

    /// Listing index of a source.
    #[must_use]
    pub fn index_of(&self, source_id: &SourceId) -> Option<usize> {
        self.by_id.get(source_id).copied()
    }

    /// Number of enabled sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Whether the registry has no enabled sources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Whether `needle` occurs in `haystack` bounded by non-alphanumeric
/// characters or the text edges. Both sides must already be lowercased.
fn contains_token(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }

    haystack.match_indices(needle).any(|(start, matched)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + matched.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}
