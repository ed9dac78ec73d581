use std::path::Path;

use scraper::{ElementRef, Html, Selector};

use super::{RawRows, SourceAdapter};
use crate::core::{LedgerError, RawRow};

/// Columns of a payment row, taken from cells 1 to 4 (cell 0 is a checkbox).
pub const TERMINAL_COLUMNS: [&str; 4] = ["Nr", "Datum", "Betrag", "Zahlart"];

const ROW_CELLS: usize = 5;

/// Payment listing saved from the cash terminal web UI.
///
/// Reads the rows of `table#trans`, skipping its header row. Only rows with
/// exactly five cells are payments; subtotal and spacer rows are ignored.
#[derive(Debug, Clone, Default)]
pub struct TerminalPageSource;

impl TerminalPageSource {
    /// Create an adapter for the `table#trans` listing.
    pub fn new() -> Self {
        Self
    }

    /// Parse an HTML page already in memory.
    pub fn parse_html(&self, file: &Path, html: &str) -> Result<RawRows, LedgerError> {
        let document = Html::parse_document(html);
        let table = selector("table#trans")?;
        let tr = selector("tr")?;
        let td = selector("td")?;

        let Some(table) = document.select(&table).next() else {
            return Err(LedgerError::malformed(file, "no table with id 'trans' found"));
        };

        let headers: Vec<String> = TERMINAL_COLUMNS.iter().map(|c| c.to_string()).collect();
        let mut rows = Vec::new();
        for (i, row) in table.select(&tr).enumerate().skip(1) {
            let cells: Vec<String> = row.select(&td).map(cell_text).collect();
            if cells.len() != ROW_CELLS {
                continue;
            }
            rows.push(RawRow::from_record(
                i + 1,
                &headers,
                cells[1..].iter().map(String::as_str),
            ));
        }
        tracing::info!(file = %file.display(), rows = rows.len(), "read terminal payments");
        Ok(RawRows::from_vec(file, headers, rows))
    }
}

impl SourceAdapter for TerminalPageSource {
    fn open(&self, path: &Path) -> Result<RawRows, LedgerError> {
        let bytes = std::fs::read(path).map_err(|e| LedgerError::io(path, e))?;
        let html = String::from_utf8_lossy(&bytes);
        self.parse_html(path, &html)
    }
}

fn selector(s: &str) -> Result<Selector, LedgerError> {
    Selector::parse(s).map_err(|e| LedgerError::Configuration(format!("bad selector '{s}': {e}")))
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().map(str::trim).collect()
}
