use std::collections::HashMap;

use scraper::{ElementRef, Html};

use crate::dom;
use crate::error::{IngestError, Result};
use crate::record::MISSING_DATA;

/// An anchor found inside a row cell, kept alongside the cell text because
/// the game identity is derived from a link, not from table text.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLink {
    pub column: usize,
    pub text: String,
    pub href: String,
}

/// One body row: raw cell texts in document order plus any embedded links.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTableRow {
    pub cells: Vec<String>,
    pub links: Vec<RowLink>,
}

/// One extracted table: a shared header-name -> column-index mapping and the
/// body rows. Column order is not stable across requests, so every field
/// access must go through the mapping rather than a positional literal.
#[derive(Debug, Clone, Default)]
pub struct SituationTable {
    pub columns: HashMap<String, usize>,
    pub rows: Vec<RawTableRow>,
}

impl SituationTable {
    pub fn column(&self, name: &str) -> Result<usize> {
        self.columns
            .get(name)
            .copied()
            .ok_or_else(|| IngestError::SchemaNotFound {
                context: format!("column {name:?} absent from header"),
            })
    }

    /// Cell text of `row` under the named header.
    pub fn field<'a>(&self, row: &'a RawTableRow, name: &str) -> Result<&'a str> {
        let idx = self.column(name)?;
        row.cells
            .get(idx)
            .map(String::as_str)
            .ok_or_else(|| IngestError::SchemaNotFound {
                context: format!("row has no cell for column {name:?} (index {idx})"),
            })
    }
}

/// Extracts the table with the given `id` attribute: header mapping from the
/// `<thead>` cell texts (exact, as published), then each `<tbody>` row's cell
/// texts with the single-dash "no data" marker replaced by the numeric
/// sentinel. Fails with `SchemaNotFound` when the structure is absent, which
/// is fatal for the whole run for that situation.
pub fn extract_table(doc: &Html, table_id: &str) -> Result<SituationTable> {
    let table = dom::find_table(doc, table_id).ok_or_else(|| IngestError::SchemaNotFound {
        context: format!("table#{table_id} not found"),
    })?;
    extract_table_from(table, table_id)
}

/// Same extraction for a table element already located in a document,
/// used by the report miner for the skaters sub-table.
pub fn extract_table_from(table: ElementRef<'_>, context: &str) -> Result<SituationTable> {
    let headers = dom::header_cells(table);
    if headers.is_empty() {
        return Err(IngestError::SchemaNotFound {
            context: format!("{context}: no header row"),
        });
    }
    let columns = headers
        .into_iter()
        .enumerate()
        .map(|(idx, name)| (name, idx))
        .collect();

    let rows = dom::body_rows(table)
        .into_iter()
        .map(extract_row)
        .collect::<Vec<_>>();

    Ok(SituationTable { columns, rows })
}

fn extract_row(row: ElementRef<'_>) -> RawTableRow {
    let mut out = RawTableRow::default();
    for (column, cell) in dom::row_cells(row).into_iter().enumerate() {
        let text = dom::text_of(cell);
        out.cells.push(substitute_sentinel(text));
        for anchor in dom::anchors(cell) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            out.links.push(RowLink {
                column,
                text: dom::text_of(anchor),
                href: href.to_string(),
            });
        }
    }
    out
}

fn substitute_sentinel(text: String) -> String {
    if text.trim() == "-" {
        MISSING_DATA.to_string()
    } else {
        text
    }
}
