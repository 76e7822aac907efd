//! Configuration management for PharmaScout.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration.
///
/// This is loaded from `~/.config/pharmascout/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Discovery run behavior
    pub discovery: DiscoveryConfig,
    /// Content fetching settings
    pub fetcher: FetcherConfig,
    /// Durable store settings
    pub database: DatabaseConfig,
    /// Source registry settings
    pub registry: RegistryConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit file path.
    ///
    /// Unlike [`AppConfig::load`], a missing file is an error here.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }

        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `PHARMASCOUT_DATABASE_PATH`: Override the database file path
    /// - `PHARMASCOUT_FETCH_TIMEOUT_SECS`: Override the per-request fetch timeout
    /// - `PHARMASCOUT_MAX_CONCURRENT_SOURCES`: Override source concurrency
    /// - `PHARMASCOUT_DEFINITIONS_DIR`: Override the source definitions directory
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `PHARMASCOUT_*` environment overrides in place.
    ///
    /// Values that fail to parse are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("PHARMASCOUT_DATABASE_PATH") {
            tracing::debug!("Override database.path from env: {}", val);
            self.database.path = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var("PHARMASCOUT_FETCH_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                self.discovery.fetch_timeout_secs = secs;
                tracing::debug!("Override discovery.fetch_timeout_secs from env: {}", secs);
            }
        }

        if let Ok(val) = std::env::var("PHARMASCOUT_MAX_CONCURRENT_SOURCES") {
            if let Ok(max) = val.parse() {
                self.discovery.max_concurrent_sources = max;
                tracing::debug!("Override discovery.max_concurrent_sources from env: {}", max);
            }
        }

        if let Ok(val) = std::env::var("PHARMASCOUT_DEFINITIONS_DIR") {
            tracing::debug!("Override registry.definitions_dir from env: {}", val);
            self.registry.definitions_dir = Some(PathBuf::from(val));
        }
    }

    /// Check values that would make a discovery run meaningless.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.discovery.max_concurrent_sources == 0 {
            return Err(ConfigError::InvalidValue {
                field: "discovery.max_concurrent_sources".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if self.discovery.fetch_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "discovery.fetch_timeout_secs".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "database.max_connections".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/pharmascout/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("org", "pharmascout", "pharmascout")
            .ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path.
    ///
    /// Uses XDG base directories: `~/.local/share/pharmascout`
    pub fn data_dir() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("org", "pharmascout", "pharmascout")
            .ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.data_dir().to_path_buf())
    }
}

/// Discovery run behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Number of sources fetched concurrently within one run
    pub max_concurrent_sources: usize,
    /// Per-request fetch timeout in seconds
    pub fetch_timeout_secs: u64,
    /// Retry attempts for transient fetch errors (0 = no retries)
    pub max_retries: u32,
    /// Base delay between retries in milliseconds (multiplied by attempt)
    pub retry_delay_ms: u64,
    /// Default deadline for a whole run in seconds
    pub run_deadline_secs: u64,
}

impl DiscoveryConfig {
    /// Per-request fetch timeout.
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Default whole-run deadline, measured from run start.
    #[must_use]
    pub fn run_deadline(&self) -> Duration {
        Duration::from_secs(self.run_deadline_secs)
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_concurrent_sources: 4,
            fetch_timeout_secs: 30,
            max_retries: 2,
            retry_delay_ms: 1500,
            run_deadline_secs: 300,
        }
    }
}

/// Content fetching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// User agent string sent to regulator sites
    pub user_agent: String,
    /// Minimum delay between two requests to the same domain, in milliseconds
    pub min_domain_delay_ms: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: "PharmaScout/0.1.0 (regulatory manufacturer discovery)".to_string(),
            min_domain_delay_ms: 1000,
        }
    }
}

/// Durable store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the `SQLite` database file (or `:memory:`)
    pub path: PathBuf,
    /// Maximum pooled connections
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("pharmascout.db"),
            max_connections: 5,
        }
    }
}

/// Source registry settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Directory holding source definition TOML files.
    ///
    /// `None` means `source-definitions/` at the workspace root.
    pub definitions_dir: Option<PathBuf>,
}
