//! PharmaScout Registry - The allow-list of trusted regulatory sources.
//!
//! This crate provides the source definition types, loading of TOML
//! definition files, and the immutable [`SourceRegistry`] that every other
//! pipeline component consults. [`SourceRegistry::resolve`] is the single
//! enforcement point of the regulator-only provenance policy.
//!
//! # Architecture
//!
//! - **Definition Types** ([`definition`]): Strongly-typed source metadata and search configuration
//! - **Loader** ([`loader`]): TOML file loading from `source-definitions/` directory
//! - **Registry** ([`registry`]): Ordered, read-only registry with strict provenance resolution
//! - **Errors** ([`error`]): Registry-specific error types
//!
//! # Example
//!
//! ```rust,no_run
//! use pharmascout_registry::{SourceLoader, SourceRegistry};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let loader = SourceLoader::with_default_dir()?;
//! let registry = SourceRegistry::load_from(&loader)?;
//!
//! for source in registry.list_sources() {
//!     println!("{} ({:?})", source.name(), source.kind());
//! }
//!
//! assert!(registry.resolve("Google search result").is_none());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod definition;
pub mod error;
pub mod loader;
pub mod registry;

// Re-export commonly used types
pub use definition::{SearchConfig, SourceDefinition, SourceKind, SourceMetadata};
pub use error::{RegistryError, Result};
pub use loader::SourceLoader;
pub use registry::SourceRegistry;
