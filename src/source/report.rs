//! Table shape of the bakery POS cash report.
//!
//! The report lists one block per branch: a header row naming the branch,
//! item rows, and a summary row starting with `Datum: dd.mm.yyyy` that
//! carries the day's totals. Only summary rows become [`RawRow`]s, tagged
//! with the branch of the block they close.

use std::path::Path;

use crate::core::{LedgerError, RawRow};

/// Columns of the rows produced from a cash report.
pub const REPORT_COLUMNS: [&str; 6] = [
    "Datum",
    "Filiale",
    "Bereinigter Umsatz",
    "Einnahmen 19%",
    "Einnahmen 7%",
    "Gutscheine",
];

// Cell positions in a summary row.
const REVENUE: usize = 1;
const GROSS_19: usize = 5;
const GROSS_7: usize = 6;
const VOUCHERS: usize = 7;

/// Turn the cells of an extracted report table into summary rows.
///
/// `branches` are substrings identifying branch header rows. When empty, a
/// row whose first cell is the only non-blank cell counts as a branch
/// header.
pub fn report_rows(
    file: &Path,
    table: &[Vec<String>],
    branches: &[String],
) -> Result<Vec<RawRow>, LedgerError> {
    let headers: Vec<String> = REPORT_COLUMNS.iter().map(|c| c.to_string()).collect();
    let mut current_branch = String::new();
    let mut rows = Vec::new();

    for (i, cells) in table.iter().enumerate() {
        let first = cells.first().map(|c| c.trim()).unwrap_or("");
        if first.is_empty() {
            continue;
        }
        if first.contains("Datum") {
            let has_total = cells.get(REVENUE).is_some_and(|c| !c.trim().is_empty());
            if !has_total {
                continue;
            }
            if cells.len() <= VOUCHERS {
                return Err(LedgerError::malformed(
                    file,
                    format!(
                        "summary row {} has {} cells, expected at least {}",
                        i + 1,
                        cells.len(),
                        VOUCHERS + 1
                    ),
                ));
            }
            let date = first.trim_start_matches("Datum").trim_start_matches(':').trim();
            let values = [
                date,
                current_branch.as_str(),
                cells[REVENUE].trim(),
                cells[GROSS_19].trim(),
                cells[GROSS_7].trim(),
                cells[VOUCHERS].trim(),
            ];
            rows.push(RawRow::from_record(i + 1, &headers, values));
        } else if is_branch_header(first, cells, branches) {
            current_branch = first.to_string();
        }
    }

    if rows.is_empty() {
        return Err(LedgerError::malformed(file, "no 'Datum' summary rows found"));
    }
    tracing::info!(file = %file.display(), rows = rows.len(), "read cash report");
    Ok(rows)
}

fn is_branch_header(first: &str, cells: &[String], branches: &[String]) -> bool {
    if branches.is_empty() {
        cells.iter().skip(1).all(|c| c.trim().is_empty())
    } else {
        branches.iter().any(|b| first.contains(b.as_str()))
    }
}
