//! PharmaScout Core - Foundation crate for the PharmaScout discovery pipeline.
//!
//! This crate provides shared types, error handling and configuration
//! management that all other PharmaScout crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared newtypes (`SourceId`, `ApiName`) and key normalization
//!
//! # Example
//!
//! ```rust
//! use pharmascout_core::{ApiName, AppConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! assert!(config.discovery.max_concurrent_sources > 0);
//!
//! let api = ApiName::new("  Paracetamol ")?;
//! assert_eq!(api.as_str(), "Paracetamol");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, DatabaseConfig, DiscoveryConfig, FetcherConfig, RegistryConfig};
pub use error::{ConfigError, ConfigResult, Result, ScoutError};
pub use types::{collapse_whitespace, normalize_key, ApiName, SourceId};
