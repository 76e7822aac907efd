//! Records flowing through a discovery run.

use pharmascout_db::NewManufacturerRecord;
use serde::{Deserialize, Serialize};

/// Maximum length, in characters, of a candidate's audit excerpt.
pub const MAX_EXCERPT_CHARS: usize = 280;

/// A manufacturer mention pulled out of fetched content, not yet trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Ingredient the run is searching for
    pub api_name: String,
    /// Manufacturer as written in the content
    pub manufacturer_name: String,
    /// Site or address, if the content gives one
    pub location: Option<String>,
    /// Product or substance column/label, if present
    pub product: Option<String>,
    /// Whatever the content claims as its origin
    pub declared_source: String,
    /// Surrounding text kept for auditing
    pub raw_excerpt: String,
}

/// A candidate whose declared source resolved to a registry member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRecord {
    /// The candidate, with name fields normalized
    pub candidate: CandidateRecord,
    /// Canonical name of the resolved registry source
    pub source_name: String,
    /// Listing index of the source whose page produced the candidate
    pub registry_index: usize,
}

impl ValidatedRecord {
    /// Convert into the shape the store persists.
    #[must_use]
    pub fn into_new_record(self) -> NewManufacturerRecord {
        NewManufacturerRecord {
            api_name: self.candidate.api_name,
            manufacturer_name: self.candidate.manufacturer_name,
            location: self.candidate.location,
            product: self.candidate.product,
            source_name: self.source_name,
        }
    }
}

/// Collapse whitespace and cut to [`MAX_EXCERPT_CHARS`] characters.
#[must_use]
pub fn excerpt(text: &str) -> String {
    pharmascout_core::collapse_whitespace(text)
        .chars()
        .take(MAX_EXCERPT_CHARS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_truncates_on_char_boundary() {
        let text = "é".repeat(400);
        let cut = excerpt(&text);
        assert_eq!(cut.chars().count(), MAX_EXCERPT_CHARS);
    }

    #[test]
    fn test_excerpt_collapses_whitespace() {
        assert_eq!(excerpt("  Granules\n\tIndia   Ltd "), "Granules India Ltd");
    }

    #[test]
    fn test_into_new_record() {
        let validated = ValidatedRecord {
            candidate: CandidateRecord {
                api_name: "Paracetamol".to_string(),
                manufacturer_name: "Granules India Ltd".to_string(),
                location: Some("Hyderabad".to_string()),
                product: None,
                declared_source: "Central Drugs Standard Control Organisation".to_string(),
                raw_excerpt: String::new(),
            },
            source_name: "CDSCO".to_string(),
            registry_index: 1,
        };

        let record = validated.into_new_record();
        assert_eq!(record.source_name, "CDSCO");
        assert_eq!(record.location.as_deref(), Some("Hyderabad"));
    }
}
