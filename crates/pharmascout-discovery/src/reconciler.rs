//! Reconciling validated records against each other and the store.

use crate::records::ValidatedRecord;
use pharmascout_core::normalize_key;
use pharmascout_db::ManufacturerRecord;
use std::collections::HashSet;

/// What to persist and what to drop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Records new to the store
    pub to_insert: Vec<ValidatedRecord>,
    /// Records collapsed within the run or already stored
    pub to_skip: Vec<ValidatedRecord>,
}

type StoreKey = (String, String, String);

/// Split validated records into new and duplicate ones.
///
/// Records are ordered by registry listing first, so when several sources
/// list the same manufacturer for the ingredient the earliest-listed source
/// keeps the attribution. Within the run a manufacturer is kept once per
/// ingredient; against the store the full `(api, manufacturer, source)` key
/// decides.
#[must_use]
pub fn reconcile(mut validated: Vec<ValidatedRecord>, existing: &[ManufacturerRecord]) -> ReconcilePlan {
    validated.sort_by_key(|record| record.registry_index);

    let stored: HashSet<StoreKey> = existing
        .iter()
        .map(|record| {
            (
                normalize_key(&record.api_name),
                normalize_key(&record.manufacturer_name),
                normalize_key(&record.source_name),
            )
        })
        .collect();

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut plan = ReconcilePlan::default();

    for record in validated {
        let api = normalize_key(&record.candidate.api_name);
        let manufacturer = normalize_key(&record.candidate.manufacturer_name);

        if !seen.insert((api.clone(), manufacturer.clone())) {
            plan.to_skip.push(record);
            continue;
        }

        let key = (api, manufacturer, normalize_key(&record.source_name));
        if stored.contains(&key) {
            plan.to_skip.push(record);
        } else {
            plan.to_insert.push(record);
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::CandidateRecord;
    use chrono::Utc;

    fn validated(manufacturer: &str, source: &str, index: usize) -> ValidatedRecord {
        ValidatedRecord {
            candidate: CandidateRecord {
                api_name: "Paracetamol".to_string(),
                manufacturer_name: manufacturer.to_string(),
                location: None,
                product: None,
                declared_source: source.to_string(),
                raw_excerpt: String::new(),
            },
            source_name: source.to_string(),
            registry_index: index,
        }
    }

    fn stored(api: &str, manufacturer: &str, source: &str) -> ManufacturerRecord {
        ManufacturerRecord {
            id: "00000000-0000-4000-8000-000000000000".to_string(),
            api_name: api.to_string(),
            manufacturer_name: manufacturer.to_string(),
            location: None,
            product: None,
            source_name: source.to_string(),
            discovered_at: Utc::now(),
        }
    }

    fn names(records: &[ValidatedRecord]) -> Vec<(&str, &str)> {
        records
            .iter()
            .map(|r| (r.candidate.manufacturer_name.as_str(), r.source_name.as_str()))
            .collect()
    }

    #[test]
    fn test_all_new() {
        let plan = reconcile(
            vec![validated("Granules India Ltd", "CDSCO", 0), validated("Mallinckrodt", "FDA", 1)],
            &[],
        );
        assert_eq!(plan.to_insert.len(), 2);
        assert!(plan.to_skip.is_empty());
    }

    #[test]
    fn test_existing_records_skipped_case_insensitively() {
        let plan = reconcile(
            vec![validated("Granules India Ltd", "CDSCO", 0), validated("Mallinckrodt", "FDA", 1)],
            &[stored("PARACETAMOL", "granules  india ltd", "cdsco")],
        );
        assert_eq!(names(&plan.to_insert), vec![("Mallinckrodt", "FDA")]);
        assert_eq!(names(&plan.to_skip), vec![("Granules India Ltd", "CDSCO")]);
    }

    #[test]
    fn test_earliest_listed_source_wins() {
        // completion order had source B first
        let plan = reconcile(
            vec![validated("Delta Chem", "Agency B", 1), validated("delta chem", "Agency A", 0)],
            &[],
        );
        assert_eq!(names(&plan.to_insert), vec![("delta chem", "Agency A")]);
        assert_eq!(names(&plan.to_skip), vec![("Delta Chem", "Agency B")]);
    }

    #[test]
    fn test_same_source_repeated_across_pages() {
        let plan = reconcile(
            vec![
                validated("Granules India Ltd", "CDSCO", 0),
                validated("Granules India Ltd", "CDSCO", 0),
                validated("Aarti Drugs", "CDSCO", 0),
            ],
            &[],
        );
        assert_eq!(plan.to_insert.len(), 2);
        assert_eq!(plan.to_skip.len(), 1);
    }

    #[test]
    fn test_same_manufacturer_stored_under_other_source_is_new() {
        let plan = reconcile(
            vec![validated("Delta Chem", "Agency A", 0)],
            &[stored("Paracetamol", "Delta Chem", "Agency B")],
        );
        assert_eq!(plan.to_insert.len(), 1);
    }
}
