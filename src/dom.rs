//! Thin capability layer over the parsed document. All text-driven DOM
//! navigation (label lookup, sibling traversal, header discovery) lives
//! here so the extractors stay free of selector plumbing.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

static LABELS: Lazy<Selector> = Lazy::new(|| parse_static("label"));
static HEADER_CELLS: Lazy<Selector> = Lazy::new(|| parse_static("thead th, thead td"));
static BODY_ROWS: Lazy<Selector> = Lazy::new(|| parse_static("tbody tr"));
static CELLS: Lazy<Selector> = Lazy::new(|| parse_static("td"));
static ANCHORS: Lazy<Selector> = Lazy::new(|| parse_static("a"));
static HEADINGS: Lazy<Selector> = Lazy::new(|| parse_static("h1, h2, h3, h4, h5, h6"));
static H3: Lazy<Selector> = Lazy::new(|| parse_static("h3"));
static DATA_DIV: Lazy<Selector> = Lazy::new(|| parse_static("div.tpp.datadiv"));

fn parse_static(selector: &str) -> Selector {
    Selector::parse(selector).expect("static selector is valid")
}

/// Concatenated descendant text of an element, as published.
pub fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// The `<label>` whose trimmed text equals `label_text` exactly.
pub fn find_labeled_section<'a>(doc: &'a Html, label_text: &str) -> Option<ElementRef<'a>> {
    doc.select(&LABELS)
        .find(|label| text_of(*label).trim() == label_text)
}

/// Nearest following sibling `<div>` of a label; the site places a section's
/// content container directly after its label.
pub fn section_container(label: ElementRef<'_>) -> Option<ElementRef<'_>> {
    label
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|sibling| sibling.value().name() == "div")
}

/// Nearest enclosing `<div>` of an element.
pub fn enclosing_div(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| ancestor.value().name() == "div")
}

/// A `<table>` identified by its `id` attribute.
pub fn find_table<'a>(doc: &'a Html, table_id: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(&format!("table#{table_id}")).ok()?;
    doc.select(&selector).next()
}

/// Header cell texts of a table, in document order. The site mixes `<th>`
/// and `<td>` inside `<thead>` depending on the table.
pub fn header_cells(table: ElementRef<'_>) -> Vec<String> {
    table.select(&HEADER_CELLS).map(text_of).collect()
}

pub fn body_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    table.select(&BODY_ROWS).collect()
}

pub fn row_cells(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    row.select(&CELLS).collect()
}

pub fn anchors(cell: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    cell.select(&ANCHORS).collect()
}

/// Count of heading elements (h1..h6) nested under `container`.
///
/// The report pages render one heading per power-play opportunity, so the
/// count stands in for an opportunity total the source never states
/// numerically. Swap this out here if the site ever exposes a real field.
pub fn heading_count(container: ElementRef<'_>) -> usize {
    container.select(&HEADINGS).count()
}

/// The `div.tpp.datadiv` data sub-container of a report section.
pub fn data_subcontainer(section: ElementRef<'_>) -> Option<ElementRef<'_>> {
    section.select(&DATA_DIV).next()
}

/// The `<h3>` inside `container` whose trimmed text equals `title`.
pub fn find_h3<'a>(container: ElementRef<'a>, title: &str) -> Option<ElementRef<'a>> {
    container
        .select(&H3)
        .find(|heading| text_of(*heading).trim() == title)
}

/// Nearest following sibling `<table>` of a heading.
pub fn next_table(heading: ElementRef<'_>) -> Option<ElementRef<'_>> {
    heading
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|sibling| sibling.value().name() == "table")
}
