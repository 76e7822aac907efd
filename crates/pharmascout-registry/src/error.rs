//! Error types for the source registry.

use thiserror::Error;

/// Errors that can occur while loading or building the registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Source definition not found
    #[error("source definition not found: {source_id}")]
    NotFound {
        /// The source ID that was not found
        source_id: String,
    },

    /// Failed to load source definition from file
    #[error("failed to load source definition from {path}: {source}")]
    LoadError {
        /// Path to the definition file
        path: String,
        /// Underlying error
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to parse source definition TOML
    #[error("failed to parse source definition TOML in {path}: {source}")]
    ParseError {
        /// Path to the definition file
        path: String,
        /// TOML parse error
        #[source]
        source: toml::de::Error,
    },

    /// Invalid source definition (validation failed)
    #[error("invalid source definition for {source_id}: {reason}")]
    ValidationError {
        /// Source ID being validated
        source_id: String,
        /// Reason for validation failure
        reason: String,
    },

    /// Two definitions share an ID or a (case-insensitive) canonical name
    #[error("duplicate source in registry: {name}")]
    DuplicateSource {
        /// The conflicting ID or name
        name: String,
    },

    /// Source definition directory not found
    #[error("source definitions directory not found at {path}")]
    DirectoryNotFound {
        /// Expected directory path
        path: String,
    },

    /// I/O error while accessing source definitions
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid source ID format
    #[error("invalid source ID: {0}")]
    InvalidId(#[from] pharmascout_core::ScoutError),
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
