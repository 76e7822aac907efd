//! Subcommand handlers.

use anyhow::{Context, Result};
use pharmascout_core::AppConfig;
use pharmascout_db::{Database, ManufacturerRecord, ManufacturerStore, MatchMode};
use pharmascout_discovery::{DiscoveryOrchestrator, DiscoveryRunResult};
use pharmascout_fetcher::HttpFetcher;
use pharmascout_registry::SourceRegistry;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

/// Run one discovery and print its summary.
pub async fn discover(
    config: &AppConfig,
    registry: Arc<SourceRegistry>,
    db: Arc<Database>,
    api_name: &str,
    deadline_secs: Option<u64>,
    json: bool,
) -> Result<()> {
    let fetcher = HttpFetcher::new(&config.fetcher).context("failed to build HTTP client")?;

    let budget = deadline_secs.map_or_else(|| config.discovery.run_deadline(), Duration::from_secs);
    let deadline = Instant::now() + budget;

    info!(api = %api_name, sources = registry.len(), budget = ?budget, "starting discovery");

    let orchestrator = DiscoveryOrchestrator::new(registry, Arc::new(fetcher), db)
        .with_config(config.discovery.clone());

    let result = orchestrator
        .run_discovery(api_name, deadline)
        .await
        .with_context(|| format!("discovery for '{api_name}' failed"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", render_run_result(&result));
    }

    Ok(())
}

/// Print the registry in listing order.
pub fn sources(registry: &SourceRegistry) {
    for (index, source) in registry.list_sources().iter().enumerate() {
        println!(
            "{:>2}. {:<10} {:<40} {:<20} {}",
            index + 1,
            source.id(),
            source.name(),
            source.kind().display_name(),
            source.locale()
        );
    }
}

/// Print stored manufacturers of one ingredient.
pub async fn list(store: &dyn ManufacturerStore, api_name: &str, json: bool) -> Result<()> {
    let records = store.query_by_api_name(api_name.trim()).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        print!("{}", render_records(api_name.trim(), &records));
    }

    Ok(())
}

/// Delete records attributed to matching sources.
pub async fn purge(store: &dyn ManufacturerStore, pattern: &str, like: bool) -> Result<()> {
    let mode = if like { MatchMode::Like } else { MatchMode::Exact };
    let deleted = store.delete_by_source_pattern(pattern, mode).await?;

    info!(pattern = %pattern, ?mode, deleted, "purged records");
    println!("Deleted {deleted} record(s) attributed to '{pattern}'");

    Ok(())
}

fn render_run_result(result: &DiscoveryRunResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Discovery for {}", result.api_name);
    let _ = writeln!(out, "  sources queried: {}", result.sources_queried);
    let _ = writeln!(out, "  inserted:        {}", result.inserted_count);
    let _ = writeln!(out, "  duplicates:      {}", result.duplicate_count);
    let _ = writeln!(out, "  rejected:        {}", result.rejected_count);

    if !result.per_source_errors.is_empty() {
        let _ = writeln!(out, "  source errors:");
        for (source, error) in &result.per_source_errors {
            let _ = writeln!(out, "    {source}: {error}");
        }
    }

    out
}

fn render_records(api_name: &str, records: &[ManufacturerRecord]) -> String {
    if records.is_empty() {
        return format!("No manufacturers stored for {api_name}\n");
    }

    let mut out = String::new();
    for record in records {
        let _ = write!(out, "{} [{}]", record.manufacturer_name, record.source_name);
        if let Some(location) = &record.location {
            let _ = write!(out, " {location}");
        }
        if let Some(product) = &record.product {
            let _ = write!(out, " ({product})");
        }
        let _ = writeln!(out, " {}", record.discovered_at.format("%Y-%m-%d"));
    }
    out
}
