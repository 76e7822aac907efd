//! Wiring of the pipeline components from configuration.

use anyhow::{Context, Result};
use pharmascout_core::AppConfig;
use pharmascout_db::Database;
use pharmascout_registry::{SourceLoader, SourceRegistry};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

const MEMORY_PATH: &str = ":memory:";

/// Load the source registry.
///
/// The `--definitions` flag wins over `registry.definitions_dir`, which wins
/// over `source-definitions/` at the workspace root.
pub fn open_registry(config: &AppConfig, definitions: Option<&Path>) -> Result<Arc<SourceRegistry>> {
    let loader = match definitions.or(config.registry.definitions_dir.as_deref()) {
        Some(dir) => SourceLoader::new(dir),
        None => SourceLoader::with_default_dir(),
    }
    .context("source definitions directory not found")?;

    let registry = SourceRegistry::load_from(&loader).with_context(|| {
        format!(
            "failed to load source definitions from {}",
            loader.definitions_dir().display()
        )
    })?;

    info!(
        sources = registry.len(),
        dir = %loader.definitions_dir().display(),
        "Source registry loaded"
    );

    Ok(Arc::new(registry))
}

/// Open the manufacturer store and apply pending migrations.
pub async fn open_database(config: &AppConfig) -> Result<Arc<Database>> {
    let mut db_config = config.database.clone();
    db_config.path = resolve_database_path(&db_config.path)?;

    info!("Database path: {}", db_config.path.display());

    let db = Database::open(&db_config)
        .await
        .context("failed to open database")?;

    Ok(Arc::new(db))
}

/// Relative database paths live under the platform data directory.
pub fn resolve_database_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() || path.as_os_str() == MEMORY_PATH {
        return Ok(path.to_path_buf());
    }

    let data_dir = AppConfig::data_dir().context("failed to determine data directory")?;
    Ok(data_dir.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DEFINITION: &str = r#"
[source]
id = "in-cdsco"
name = "CDSCO"
locale = "en-IN"
kind = "tabular-listing"
listing_order = 1
last_verified = "2026-09-01"

[search]
url_pattern = "https://cdsco.example.gov/api-listing?q={query}&page={page}"
max_pages = 2
"#;

    #[test]
    fn test_memory_and_absolute_paths_unchanged() {
        assert_eq!(
            resolve_database_path(Path::new(":memory:")).expect("resolve"),
            PathBuf::from(":memory:")
        );

        let temp_dir = TempDir::new().expect("create temp dir");
        let absolute = temp_dir.path().join("scout.db");
        assert_eq!(resolve_database_path(&absolute).expect("resolve"), absolute);
    }

    #[test]
    fn test_relative_path_joins_data_dir() {
        // Some CI containers have no home directory to derive one from
        if let Ok(data_dir) = AppConfig::data_dir() {
            let resolved = resolve_database_path(Path::new("scout.db")).expect("resolve");
            assert_eq!(resolved, data_dir.join("scout.db"));
        }
    }

    #[test]
    fn test_open_registry_prefers_flag_over_config() {
        let flag_dir = TempDir::new().expect("create temp dir");
        std::fs::write(flag_dir.path().join("in-cdsco.toml"), DEFINITION).expect("write definition");

        let mut config = AppConfig::default();
        config.registry.definitions_dir = Some(PathBuf::from("/nonexistent/definitions"));

        let registry = open_registry(&config, Some(flag_dir.path())).expect("open registry");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.list_sources()[0].name(), "CDSCO");

        assert!(open_registry(&config, None).is_err());
    }

    #[tokio::test]
    async fn test_open_database_in_memory() {
        let mut config = AppConfig::default();
        config.database.path = PathBuf::from(":memory:");

        let db = open_database(&config).await.expect("open database");
        assert!(db.get_schema_version().await.expect("schema version") >= 1);
    }
}
