use super::{clean_field, declared_source, names_other_product, page_publisher, Extraction, ExtractionStrategy};
use crate::records::{excerpt, CandidateRecord};
use once_cell::sync::Lazy;
use pharmascout_core::ApiName;
use pharmascout_registry::SourceDefinition;
use regex::Regex;
use scraper::{Html, Selector};

static LABEL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(manufacturer(?:'s)?(?:\s+name)?|location|address|site|product|substance|source|reported\s+by)\s*:",
    )
    .expect("valid label regex")
});

static PROSE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\bmanufactured\s+by\s+(?:the\s+)?(?P<name>[^,.;()\n]+?)(?:\s+(?:in|at)\s+(?P<location>[^.;()\n]+))?\s*(?:[,.;()\n]|$)",
    )
    .expect("valid prose regex")
});

static PROSE_SOURCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:reported|listed|registered|approved)\s+by\s+(?:the\s+)?(?P<source>[^.;,()\n]+)")
        .expect("valid prose source regex")
});

static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("valid paragraph regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Manufacturer,
    Location,
    Product,
    Source,
}

impl Label {
    fn parse(label: &str) -> Self {
        let label = label.to_lowercase();
        if label.starts_with("manufacturer") {
            Self::Manufacturer
        } else if label.starts_with("product") || label.starts_with("substance") {
            Self::Product
        } else if label.starts_with("source") || label.starts_with("reported") {
            Self::Source
        } else {
            Self::Location
        }
    }
}

#[derive(Debug, Default)]
struct LabelledRecord {
    manufacturer: Option<String>,
    location: Option<String>,
    product: Option<String>,
    source: Option<String>,
}

/// Free-text documents: assessment reports, notices, certificates.
#[derive(Debug, Clone, Copy, Default)]
pub struct FreeTextStrategy;

impl ExtractionStrategy for FreeTextStrategy {
    fn extract(&self, api_name: &ApiName, source: &SourceDefinition, content: &str) -> Extraction {
        let (segments, publisher) = segments(content);

        // Records without a product are only trusted on pages about the ingredient.
        if !segments.iter().any(|segment| api_name.is_mentioned_in(segment)) {
            return Extraction::empty();
        }

        let mut candidates = Vec::new();

        for segment in &segments {
            if let Some(record) = labelled_record(segment) {
                if names_other_product(api_name, record.product.as_deref()) {
                    continue;
                }
                candidates.push(CandidateRecord {
                    api_name: api_name.to_string(),
                    manufacturer_name: record.manufacturer.unwrap_or_default(),
                    location: record.location,
                    product: record.product,
                    declared_source: declared_source(record.source, publisher.as_deref(), source),
                    raw_excerpt: excerpt(segment),
                });
                continue;
            }

            if !api_name.is_mentioned_in(segment) {
                continue;
            }

            let prose_source = PROSE_SOURCE_REGEX
                .captures(segment)
                .and_then(|caps| caps.name("source"))
                .and_then(|m| clean_field(m.as_str()));

            for caps in PROSE_REGEX.captures_iter(segment) {
                let Some(name) = caps.name("name").and_then(|m| clean_field(m.as_str())) else {
                    continue;
                };
                candidates.push(CandidateRecord {
                    api_name: api_name.to_string(),
                    manufacturer_name: name,
                    location: caps.name("location").and_then(|m| clean_field(m.as_str())),
                    product: None,
                    declared_source: declared_source(prose_source.clone(), publisher.as_deref(), source),
                    raw_excerpt: excerpt(segment),
                });
            }
        }

        Extraction::found(candidates)
    }
}

/// Split content into paragraphs, plus the page publisher for HTML.
fn segments(content: &str) -> (Vec<String>, Option<String>) {
    if content.contains('<') {
        let document = Html::parse_document(content);
        if let Ok(selector) = Selector::parse("p, li, dd, blockquote") {
            let segments: Vec<String> = document
                .select(&selector)
                .map(|el| el.text().collect::<Vec<_>>().join(" "))
                .filter(|text| !text.trim().is_empty())
                .collect();
            if !segments.is_empty() {
                return (segments, page_publisher(&document));
            }
        }

        let body = document.root_element().text().collect::<Vec<_>>().join("\n");
        return (split_paragraphs(&body), page_publisher(&document));
    }

    (split_paragraphs(content), None)
}

fn split_paragraphs(text: &str) -> Vec<String> {
    PARAGRAPH_BREAK
        .split(text)
        .filter(|p| !p.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Values run from one `Label:` to the next label or line end.
fn labelled_record(segment: &str) -> Option<LabelledRecord> {
    let labels: Vec<_> = LABEL_REGEX.captures_iter(segment).collect();
    if labels.is_empty() {
        return None;
    }

    let mut record = LabelledRecord::default();

    for (i, caps) in labels.iter().enumerate() {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let end = labels
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(segment.len(), |m| m.start());
        let value = &segment[whole.end()..end];
        let value = value.split('\n').next().unwrap_or(value);

        let slot = match Label::parse(name.as_str()) {
            Label::Manufacturer => &mut record.manufacturer,
            Label::Location => &mut record.location,
            Label::Product => &mut record.product,
            Label::Source => &mut record.source,
        };
        if slot.is_none() {
            *slot = clean_field(value);
        }
    }

    // A labelled block is only a record when it names a manufacturer slot.
    labels
        .iter()
        .any(|caps| caps.get(1).is_some_and(|m| Label::parse(m.as_str()) == Label::Manufacturer))
        .then_some(record)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::source;
    use super::*;
    use pharmascout_registry::SourceKind;

    fn api() -> ApiName {
        ApiName::new("Paracetamol").expect("valid API name")
    }

    fn extract(content: &str) -> Extraction {
        FreeTextStrategy.extract(&api(), &source(SourceKind::FreeTextDocument), content)
    }

    #[test]
    fn test_labelled_records_in_plain_text() {
        let content = "Certificates of suitability issued for Paracetamol.\n\n\
            Manufacturer: Granules India Ltd\nLocation: Hyderabad, India\nProduct: Paracetamol\n\n\
            Manufacturer: Mallinckrodt Inc\nAddress: St. Louis, USA\nSource: Central Drugs Standard Control Organisation";

        let extraction = extract(content);
        assert!(extraction.warning.is_none());
        assert_eq!(extraction.candidates.len(), 2);

        let first = &extraction.candidates[0];
        assert_eq!(first.manufacturer_name, "Granules India Ltd");
        assert_eq!(first.location.as_deref(), Some("Hyderabad, India"));
        assert_eq!(first.declared_source, "CDSCO");

        let second = &extraction.candidates[1];
        assert_eq!(second.location.as_deref(), Some("St. Louis, USA"));
        assert_eq!(
            second.declared_source,
            "Central Drugs Standard Control Organisation"
        );
    }

    #[test]
    fn test_labels_on_one_line() {
        let content = "<p>Paracetamol API. Manufacturer: Delta Chem Location: Vapi, Gujarat</p>";

        let extraction = extract(content);
        assert_eq!(extraction.candidates.len(), 1);
        assert_eq!(extraction.candidates[0].manufacturer_name, "Delta Chem");
        assert_eq!(extraction.candidates[0].location.as_deref(), Some("Vapi, Gujarat"));
    }

    #[test]
    fn test_prose_mentions() {
        let content = r#"<html><head><meta name="publisher" content="CDSCO"></head><body>
            <p>Paracetamol bulk drug is manufactured by Granules India Ltd in Hyderabad, Telangana.</p>
            <p>The paracetamol tablets are manufactured by  Aarti   Drugs.</p>
            <p>Ibuprofen is manufactured by IOL Chemicals.</p>
            </body></html>"#;

        let extraction = extract(content);
        let names: Vec<&str> = extraction
            .candidates
            .iter()
            .map(|c| c.manufacturer_name.as_str())
            .collect();
        assert_eq!(names, vec!["Granules India Ltd", "Aarti Drugs"]);
        assert_eq!(
            extraction.candidates[0].location.as_deref(),
            Some("Hyderabad, Telangana")
        );
        assert_eq!(extraction.candidates[0].declared_source, "CDSCO");
    }

    #[test]
    fn test_prose_declared_source() {
        let content = "Paracetamol is manufactured by Delta Chem, as reported by Google search results.";

        let extraction = extract(content);
        assert_eq!(extraction.candidates.len(), 1);
        assert_eq!(
            extraction.candidates[0].declared_source,
            "Google search results"
        );
    }

    #[test]
    fn test_other_product_label_skipped() {
        let content = "Paracetamol and other actives.\n\nManufacturer: IOL Chemicals\nProduct: Ibuprofen";
        assert!(extract(content).candidates.is_empty());
    }

    #[test]
    fn test_no_mentions_is_empty_without_warning() {
        let extraction = extract("Annual report of the agency. Nothing about any substance here.");
        assert_eq!(extraction, Extraction::empty());
    }
}
