//! Manufacturer record operations.
//!
//! This module provides the queries behind the `api_manufacturers` table:
//! lookup by ingredient, atomic batch insert and operator cleanup by source.

use crate::error::{DatabaseError, Result};
use chrono::{DateTime, Utc};
use pharmascout_core::normalize_key;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Row, Sqlite};

/// A persisted manufacturer of an active pharmaceutical ingredient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManufacturerRecord {
    /// Unique identifier (UUID v4) assigned on insert
    pub id: String,
    /// Ingredient the manufacturer produces
    pub api_name: String,
    /// Manufacturer as named by the regulator
    pub manufacturer_name: String,
    /// Manufacturing site or address, if listed
    pub location: Option<String>,
    /// Product or dosage form, if listed
    pub product: Option<String>,
    /// Canonical name of the regulator that lists this manufacturer
    pub source_name: String,
    /// When this record was first stored
    pub discovered_at: DateTime<Utc>,
}

/// A manufacturer record that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewManufacturerRecord {
    /// Ingredient the manufacturer produces
    pub api_name: String,
    /// Manufacturer as named by the regulator
    pub manufacturer_name: String,
    /// Manufacturing site or address, if listed
    pub location: Option<String>,
    /// Product or dosage form, if listed
    pub product: Option<String>,
    /// Canonical name of the regulator that lists this manufacturer
    pub source_name: String,
}

/// How `delete_by_source_pattern` compares source names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Equality after key normalization (case and whitespace insensitive)
    #[default]
    Exact,
    /// `SQL` `LIKE` pattern (`%` and `_` wildcards)
    Like,
}

/// Get every stored record for an ingredient, ignoring case and whitespace.
pub async fn query_by_api_name(
    pool: &Pool<Sqlite>,
    api_name: &str,
) -> Result<Vec<ManufacturerRecord>> {
    let rows = sqlx::query(
        "SELECT id, api_name, manufacturer_name, location, product, source_name, discovered_at
         FROM api_manufacturers
         WHERE api_key = ?
         ORDER BY discovered_at ASC, manufacturer_name ASC",
    )
    .bind(normalize_key(api_name))
    .fetch_all(pool)
    .await?;

    parse_records_from_rows(rows)
}

/// Insert all records in one transaction.
///
/// Either every record is stored or none is. A record that collides with an
/// existing `(api_name, manufacturer_name, source_name)` row fails the whole
/// batch with [`DatabaseError::Conflict`].
pub async fn insert_batch(
    pool: &Pool<Sqlite>,
    records: Vec<NewManufacturerRecord>,
) -> Result<Vec<ManufacturerRecord>> {
    if records.is_empty() {
        return Ok(Vec::new());
    }

    let mut tx = pool.begin().await?;
    let mut inserted = Vec::with_capacity(records.len());

    for record in records {
        let id = uuid::Uuid::new_v4().to_string();
        let discovered_at = Utc::now();

        let result = sqlx::query(
            "INSERT INTO api_manufacturers
                 (id, api_name, manufacturer_name, location, product, source_name, discovered_at,
                  api_key, manufacturer_key, source_key)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&record.api_name)
        .bind(&record.manufacturer_name)
        .bind(&record.location)
        .bind(&record.product)
        .bind(&record.source_name)
        .bind(discovered_at.to_rfc3339())
        .bind(normalize_key(&record.api_name))
        .bind(normalize_key(&record.manufacturer_name))
        .bind(normalize_key(&record.source_name))
        .execute(&mut *tx)
        .await;

        if let Err(e) = result {
            let err = DatabaseError::from_insert(
                e,
                &format!(
                    "{} / {} / {}",
                    record.api_name, record.manufacturer_name, record.source_name
                ),
            );
            tx.rollback().await?;
            return Err(err);
        }

        inserted.push(ManufacturerRecord {
            id,
            api_name: record.api_name,
            manufacturer_name: record.manufacturer_name,
            location: record.location,
            product: record.product,
            source_name: record.source_name,
            discovered_at,
        });
    }

    tx.commit().await?;

    tracing::debug!(count = inserted.len(), "inserted manufacturer records");
    Ok(inserted)
}

/// Delete every record attributed to matching sources.
///
/// Returns the number of deleted rows.
pub async fn delete_by_source_pattern(
    pool: &Pool<Sqlite>,
    pattern: &str,
    mode: MatchMode,
) -> Result<u64> {
    let result = match mode {
        MatchMode::Exact => {
            sqlx::query("DELETE FROM api_manufacturers WHERE source_key = ?")
                .bind(normalize_key(pattern))
                .execute(pool)
                .await?
        }
        MatchMode::Like => {
            sqlx::query("DELETE FROM api_manufacturers WHERE source_name LIKE ?")
                .bind(pattern)
                .execute(pool)
                .await?
        }
    };

    tracing::info!(
        pattern = %pattern,
        mode = ?mode,
        deleted = result.rows_affected(),
        "deleted manufacturer records by source"
    );
    Ok(result.rows_affected())
}

fn parse_records_from_rows(rows: Vec<sqlx::sqlite::SqliteRow>) -> Result<Vec<ManufacturerRecord>> {
    let mut records = Vec::with_capacity(rows.len());

    for row in rows {
        let discovered_at_str: String = row.try_get("discovered_at")?;
        let discovered_at = DateTime::parse_from_rfc3339(&discovered_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                DatabaseError::Decode(format!("invalid discovered_at '{discovered_at_str}': {e}"))
            })?;

        records.push(ManufacturerRecord {
            id: row.try_get("id")?,
            api_name: row.try_get("api_name")?,
            manufacturer_name: row.try_get("manufacturer_name")?,
            location: row.try_get("location")?,
            product: row.try_get("product")?,
            source_name: row.try_get("source_name")?,
            discovered_at,
        });
    }

    Ok(records)
}
