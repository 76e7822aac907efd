//! Checks the definitions shipped in `source-definitions/`.

use pharmascout_core::SourceId;
use pharmascout_registry::{SourceKind, SourceLoader, SourceRegistry};

fn shipped_registry() -> SourceRegistry {
    let loader = SourceLoader::with_default_dir().expect("source-definitions directory");
    SourceRegistry::load_from(&loader).expect("shipped definitions load")
}

#[test]
fn test_all_shipped_definitions_are_valid() {
    let loader = SourceLoader::with_default_dir().expect("source-definitions directory");
    let definitions = loader.load_all().expect("load definitions");

    assert!(!definitions.is_empty());
    for definition in &definitions {
        definition
            .validate()
            .unwrap_or_else(|e| panic!("{} is invalid: {e}", definition.id()));
    }
}

#[test]
fn test_shipped_registry_order() {
    let registry = shipped_registry();
    let ids: Vec<&str> = registry
        .list_sources()
        .iter()
        .map(|source| source.id().as_str())
        .collect();

    assert_eq!(ids.first(), Some(&"us-fda"));
    assert_eq!(
        registry.index_of(&SourceId::new("in-cdsco").expect("valid id")),
        Some(1)
    );
}

#[test]
fn test_shipped_registry_resolves_agency_names() {
    let registry = shipped_registry();

    let fda = registry
        .resolve("Listed by the U.S. Food and Drug Administration")
        .expect("FDA resolves");
    assert_eq!(fda.name(), "FDA");
    assert_eq!(fda.kind(), SourceKind::JsonRecords);

    let ema = registry
        .resolve("https://www.ema.europa.eu/en/documents/assessment-report")
        .expect("EMA resolves by host");
    assert_eq!(ema.name(), "EMA");

    assert!(registry.resolve("Google search result").is_none());
    assert!(registry.resolve("pharmacompass.com").is_none());
}
