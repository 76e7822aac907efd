use super::{clean_field, declared_source, names_other_product, Extraction, ExtractionStrategy};
use crate::records::{excerpt, CandidateRecord};
use pharmascout_core::ApiName;
use pharmascout_registry::SourceDefinition;
use serde_json::{Map, Value};

const MANUFACTURER_KEYS: &[&str] = &[
    "manufacturer",
    "manufacturer_name",
    "labeler_name",
    "company",
    "holder",
];
const LOCATION_KEYS: &[&str] = &["location", "address", "site", "city", "country"];
const PRODUCT_KEYS: &[&str] = &[
    "product",
    "substance",
    "substance_name",
    "active_ingredient",
    "generic_name",
];
const SOURCE_KEYS: &[&str] = &["source", "reported_by", "authority"];

/// JSON documents from public regulator APIs.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRecordsStrategy;

impl ExtractionStrategy for JsonRecordsStrategy {
    fn extract(&self, api_name: &ApiName, source: &SourceDefinition, content: &str) -> Extraction {
        let document: Value = match serde_json::from_str(content) {
            Ok(value) => value,
            Err(e) => return Extraction::unparseable(format!("invalid JSON: {e}")),
        };

        let mut candidates = Vec::new();
        collect(&document, api_name, source, &mut candidates);
        Extraction::found(candidates)
    }
}

/// Walk the document; an object carrying a manufacturer key is one record
/// and is not descended into.
fn collect(value: &Value, api_name: &ApiName, source: &SourceDefinition, out: &mut Vec<CandidateRecord>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect(item, api_name, source, out);
            }
        }
        Value::Object(object) => {
            let Some(names) = lookup(object, MANUFACTURER_KEYS) else {
                for child in object.values() {
                    collect(child, api_name, source, out);
                }
                return;
            };

            let product = lookup(object, PRODUCT_KEYS).and_then(|v| strings(v).into_iter().next());
            if names_other_product(api_name, product.as_deref()) {
                return;
            }

            let location = lookup(object, LOCATION_KEYS).and_then(|v| strings(v).into_iter().next());
            let record_source = lookup(object, SOURCE_KEYS).and_then(|v| strings(v).into_iter().next());
            let raw = serde_json::to_string(object).unwrap_or_default();

            for name in strings(names) {
                out.push(CandidateRecord {
                    api_name: api_name.to_string(),
                    manufacturer_name: name,
                    location: location.clone(),
                    product: product.clone(),
                    declared_source: declared_source(record_source.clone(), None, source),
                    raw_excerpt: excerpt(&raw),
                });
            }
        }
        _ => {}
    }
}

/// First key (case-insensitive) from `keys` present with a non-null value.
fn lookup<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| {
        object
            .iter()
            .find(|(k, v)| k.eq_ignore_ascii_case(key) && !v.is_null())
            .map(|(_, v)| v)
    })
}

/// Cleaned string values of a scalar or array field.
fn strings(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => clean_field(s).into_iter().collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .filter_map(clean_field)
            .collect(),
        _ => Vec::new(),
    }
}
