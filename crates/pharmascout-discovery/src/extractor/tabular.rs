use super::{clean_field, declared_source, names_other_product, page_publisher, Extraction, ExtractionStrategy};
use crate::records::{excerpt, CandidateRecord};
use pharmascout_core::ApiName;
use pharmascout_registry::SourceDefinition;
use scraper::{ElementRef, Html, Selector};

const SOURCE_KEYWORDS: &[&str] = &["source", "reported by", "authority", "agency", "regulator"];
const LOCATION_KEYWORDS: &[&str] = &["location", "address", "site", "country", "city"];
const PRODUCT_KEYWORDS: &[&str] = &["product", "substance", "ingredient", "drug", "api"];
const MANUFACTURER_KEYWORDS: &[&str] = &[
    "manufacturer",
    "company",
    "firm",
    "applicant",
    "holder",
    "labeler",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Manufacturer,
    Location,
    Product,
    Source,
}

#[derive(Debug, Default)]
struct ColumnMap {
    manufacturer: Option<usize>,
    location: Option<usize>,
    product: Option<usize>,
    source: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &[String]) -> Self {
        let mut map = Self::default();
        for (index, header) in headers.iter().enumerate() {
            let slot = match classify_header(header) {
                Some(Column::Manufacturer) => &mut map.manufacturer,
                Some(Column::Location) => &mut map.location,
                Some(Column::Product) => &mut map.product,
                Some(Column::Source) => &mut map.source,
                None => continue,
            };
            slot.get_or_insert(index);
        }
        map
    }
}

/// Location words win over "manufacturer" so "Manufacturer Address" is a
/// location column; manufacturer words win over product words so "API
/// Manufacturer" is the manufacturer column.
fn classify_header(header: &str) -> Option<Column> {
    let header = header.to_lowercase();
    let has = |keywords: &[&str]| keywords.iter().any(|k| header_has_word(&header, k));

    if has(SOURCE_KEYWORDS) {
        Some(Column::Source)
    } else if has(LOCATION_KEYWORDS) {
        Some(Column::Location)
    } else if has(MANUFACTURER_KEYWORDS) {
        Some(Column::Manufacturer)
    } else if has(PRODUCT_KEYWORDS) {
        Some(Column::Product)
    } else {
        None
    }
}

fn header_has_word(header: &str, keyword: &str) -> bool {
    header.match_indices(keyword).any(|(start, _)| {
        let before = header[..start].chars().next_back();
        let mut rest = header[start + keyword.len()..].chars();
        // plural headers ("Sites", "Products")
        let after = match rest.next() {
            Some('s') => rest.next(),
            other => other,
        };
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// HTML registry listings: one manufacturer per table row.
#[derive(Debug, Clone, Copy, Default)]
pub struct TabularStrategy;

impl ExtractionStrategy for TabularStrategy {
    fn extract(&self, api_name: &ApiName, source: &SourceDefinition, content: &str) -> Extraction {
        if !content.contains('<') {
            return Extraction::unparseable("content is not HTML");
        }

        let document = Html::parse_document(content);
        let (Ok(table_sel), Ok(row_sel), Ok(header_sel), Ok(cell_sel)) = (
            Selector::parse("table"),
            Selector::parse("tr"),
            Selector::parse("th"),
            Selector::parse("td"),
        ) else {
            return Extraction::unparseable("invalid table selectors");
        };

        let publisher = page_publisher(&document);
        let mut candidates = Vec::new();
        let mut tables = 0;
        let mut tables_with_manufacturer = 0;

        for table in document.select(&table_sel) {
            tables += 1;
            let rows: Vec<ElementRef> = table.select(&row_sel).collect();

            let Some(header_pos) = rows
                .iter()
                .position(|row| row.select(&header_sel).next().is_some())
            else {
                continue;
            };
            let headers: Vec<String> = rows[header_pos]
                .select(&header_sel)
                .map(|cell| cell_text(&cell))
                .collect();

            let columns = ColumnMap::from_headers(&headers);
            let Some(manufacturer_col) = columns.manufacturer else {
                continue;
            };
            tables_with_manufacturer += 1;

            for row in &rows[header_pos + 1..] {
                let cells: Vec<String> = row.select(&cell_sel).map(|cell| cell_text(&cell)).collect();
                if cells.iter().all(|cell| cell.trim().is_empty()) {
                    continue;
                }

                let field = |col: Option<usize>| col.and_then(|i| cells.get(i)).and_then(|v| clean_field(v));
                let product = field(columns.product);
                if names_other_product(api_name, product.as_deref()) {
                    continue;
                }

                candidates.push(CandidateRecord {
                    api_name: api_name.to_string(),
                    manufacturer_name: field(Some(manufacturer_col)).unwrap_or_default(),
                    location: field(columns.location),
                    product,
                    declared_source: declared_source(field(columns.source), publisher.as_deref(), source),
                    raw_excerpt: excerpt(&cells.join(" | ")),
                });
            }
        }

        if tables > 0 && tables_with_manufacturer == 0 {
            return Extraction {
                candidates,
                warning: Some("no manufacturer column in listing tables".to_string()),
            };
        }

        Extraction::found(candidates)
    }
}

fn cell_text(cell: &ElementRef) -> String {
    cell.text().collect::<Vec<_>>().join(" ")
}
