//! Shared types used across PharmaScout.
//!
//! This module defines the newtypes that identify sources and active
//! ingredients, plus the key normalization used for case-insensitive
//! de-duplication.

use crate::error::ScoutError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Newtype for source identifiers with validation.
///
/// Source IDs must be lowercase alphanumeric with hyphens, 3-50 characters.
/// They name definition files; the canonical agency name lives on the
/// definition itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SourceId(String);

impl SourceId {
    /// Create a new `SourceId` from a string.
    ///
    /// # Errors
    /// Returns error if the ID doesn't match the required format.
    pub fn new(id: impl Into<String>) -> Result<Self, ScoutError> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate source ID format: lowercase alphanumeric with hyphens, 3-50 chars.
    fn validate(id: &str) -> Result<(), ScoutError> {
        static SOURCE_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = SOURCE_REGEX
            .get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9-]{1,48}[a-z0-9]$").expect("valid regex"));

        if id.len() < 3 || id.len() > 50 {
            return Err(ScoutError::Validation(format!(
                "invalid source ID: must be 3-50 characters, got {} characters",
                id.len()
            )));
        }

        if regex.is_match(id) {
            Ok(())
        } else {
            Err(ScoutError::Validation(format!(
                "invalid source ID: must be lowercase alphanumeric with hyphens, got '{id}'"
            )))
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for SourceId {
    type Error = ScoutError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SourceId> for String {
    fn from(id: SourceId) -> Self {
        id.0
    }
}

/// Name of an active pharmaceutical ingredient.
///
/// Stored trimmed with internal whitespace collapsed; display casing is
/// preserved, comparisons go through [`ApiName::key`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApiName(String);

impl ApiName {
    /// Create a new `ApiName`.
    ///
    /// # Errors
    /// Returns error if the name is blank.
    pub fn new(name: impl AsRef<str>) -> Result<Self, ScoutError> {
        let cleaned = collapse_whitespace(name.as_ref());
        if cleaned.is_empty() {
            return Err(ScoutError::Validation(
                "API name cannot be empty".to_string(),
            ));
        }
        Ok(Self(cleaned))
    }

    /// Get the display form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison key.
    #[must_use]
    pub fn key(&self) -> String {
        normalize_key(&self.0)
    }

    /// Whether `text` mentions this ingredient (case-insensitive).
    #[must_use]
    pub fn is_mentioned_in(&self, text: &str) -> bool {
        normalize_key(text).contains(&self.key())
    }
}

impl fmt::Display for ApiName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trim and collapse runs of whitespace into single spaces.
#[must_use]
pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize a name field for case-insensitive key comparison.
#[must_use]
pub fn normalize_key(value: &str) -> String {
    collapse_whitespace(value).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_id_valid() {
        for id in ["us-fda", "cdsco", "eu-ema", "abc"] {
            assert!(SourceId::new(id).is_ok(), "Failed for: {id}");
        }
    }

    #[test]
    fn test_source_id_invalid() {
        let too_long = "a".repeat(51);
        let invalid_ids = vec![
            "ab",              // Too short
            "US-FDA",          // Uppercase
            "us_fda",          // Underscore
            "us fda",          // Space
            "-fda",            // Starts with hyphen
            "fda-",            // Ends with hyphen
            too_long.as_str(), // Too long
        ];

        for id in invalid_ids {
            assert!(SourceId::new(id).is_err(), "Should fail for: {id}");
        }
    }

    #[test]
    fn test_source_id_deserialize_validates() {
        let ok: SourceId = serde_json::from_str("\"us-fda\"").expect("valid id");
        assert_eq!(ok.as_str(), "us-fda");

        let bad: Result<SourceId, _> = serde_json::from_str("\"US FDA\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_api_name_trims_and_collapses() {
        let api = ApiName::new("  Acetylsalicylic \t acid ").expect("valid name");
        assert_eq!(api.as_str(), "Acetylsalicylic acid");
        assert_eq!(api.key(), "acetylsalicylic acid");
    }

    #[test]
    fn test_api_name_blank_rejected() {
        assert!(ApiName::new("   ").is_err());
        assert!(ApiName::new("").is_err());
    }

    #[test]
    fn test_api_name_mention() {
        let api = ApiName::new("Ibuprofen").expect("valid name");
        assert!(api.is_mentioned_in("IBUPROFEN 400 mg film-coated tablets"));
        assert!(!api.is_mentioned_in("Paracetamol 500 mg"));
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("  Acme   PHARMA\nLtd "), "acme pharma ltd");
        assert_eq!(normalize_key("Ünited Labs"), "ünited labs");
    }
}
