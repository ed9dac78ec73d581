use std::io::Cursor;
use std::path::Path;

use calamine::{Data, DataType, Range, Reader, Xlsx};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

use super::{RawRows, SourceAdapter};
use crate::core::{LedgerError, RawRow, to_locale_string};

/// Columns kept from the vending cloud export, by zero-based sheet column.
pub const VENDING_COLUMNS: [(&str, u32); 7] = [
    ("Nr", 0),
    ("Datum", 1),
    ("Maschine", 2),
    ("Barumsatz", 4),
    ("Kartenumsatz", 5),
    ("Ausbezahlt", 15),
    ("Aenderung_Wechselgeld", 22),
];

/// First worksheet of an XLSX workbook.
///
/// `skip_rows` leading rows are ignored, the next row is the header row and
/// data follows it. The header cell of the first kept column must carry that
/// column's name, which catches a wrong row offset. Reading stops at the first row whose first kept column
/// is blank (the export appends totals below a gap). Numeric cells are
/// rendered in German notation and dates as `dd.mm.yyyy`, so rows look the
/// same as rows read from text exports.
#[derive(Debug, Clone)]
pub struct SpreadsheetSource {
    skip_rows: u32,
    columns: Vec<(String, u32)>,
}

impl SpreadsheetSource {
    /// Keep `columns` (name, zero-based column index).
    pub fn new(skip_rows: usize, columns: &[(&str, u32)]) -> Self {
        Self {
            skip_rows: skip_rows as u32,
            columns: columns.iter().map(|(n, i)| (n.to_string(), *i)).collect(),
        }
    }

    /// Layout of the vending machine cloud export.
    pub fn vending(skip_rows: usize) -> Self {
        Self::new(skip_rows, &VENDING_COLUMNS)
    }

    /// Read rows from a worksheet range.
    pub fn read_range(&self, file: &Path, range: &Range<Data>) -> Result<RawRows, LedgerError> {
        let headers: Vec<String> = self.columns.iter().map(|(n, _)| n.clone()).collect();
        let Some((end_row, end_col)) = range.end() else {
            return Err(LedgerError::malformed(file, "worksheet is empty"));
        };
        let widest = self.columns.iter().map(|(_, i)| *i).max().unwrap_or(0);
        if end_col < widest {
            return Err(LedgerError::malformed(
                file,
                format!("expected at least {} columns, found {}", widest + 1, end_col + 1),
            ));
        }

        if let Some((name, col)) = self.columns.first() {
            let found = range
                .get_value((self.skip_rows, *col))
                .map(cell_text)
                .unwrap_or_default();
            if found.trim() != name {
                return Err(LedgerError::malformed(
                    file,
                    format!(
                        "expected header '{name}' in row {}, found '{}'",
                        self.skip_rows + 1,
                        found.trim()
                    ),
                ));
            }
        }

        let mut rows = Vec::new();
        let first_data = self.skip_rows + 1;
        for r in first_data..=end_row {
            let values: Vec<String> = self
                .columns
                .iter()
                .map(|(_, c)| range.get_value((r, *c)).map(cell_text).unwrap_or_default())
                .collect();
            if values.first().is_none_or(|v| v.trim().is_empty()) {
                break;
            }
            rows.push(RawRow::from_record(
                r as usize + 1,
                &headers,
                values.iter().map(String::as_str),
            ));
        }
        tracing::info!(file = %file.display(), rows = rows.len(), "read worksheet");
        Ok(RawRows::from_vec(file, headers, rows))
    }

    /// Parse an XLSX workbook already in memory.
    pub fn read_bytes(&self, file: &Path, bytes: Vec<u8>) -> Result<RawRows, LedgerError> {
        let mut workbook = Xlsx::new(Cursor::new(bytes))
            .map_err(|e| LedgerError::malformed(file, format!("failed to open workbook: {e}")))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| LedgerError::malformed(file, "no worksheet found"))?
            .map_err(|e| LedgerError::malformed(file, format!("failed to read worksheet: {e}")))?;
        self.read_range(file, &range)
    }
}

impl SourceAdapter for SpreadsheetSource {
    fn open(&self, path: &Path) -> Result<RawRows, LedgerError> {
        let bytes = std::fs::read(path).map_err(|e| LedgerError::io(path, e))?;
        self.read_bytes(path, bytes)
    }
}

fn cell_text(cell: &Data) -> String {
    if cell.is_empty() {
        return String::new();
    }
    if cell.is_datetime() || cell.is_datetime_iso() {
        if let Some(dt) = cell.as_datetime() {
            return dt.format("%d.%m.%Y").to_string();
        }
    }
    // Floats outside the decimal range keep their raw text and fail amount
    // parsing downstream.
    if let Some(f) = cell.get_float() {
        return Decimal::from_f64(f)
            .map(to_locale_string)
            .unwrap_or_else(|| f.to_string());
    }
    if let Some(i) = cell.get_int() {
        return i.to_string();
    }
    if let Some(s) = cell.get_string() {
        return s.to_string();
    }
    cell.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(rows: &[&[(u32, Data)]], skip: u32) -> Range<Data> {
        let mut range = Range::new((0, 0), (skip + rows.len() as u32 + 2, 22));
        range.set_value((skip, 0), Data::String("Nr".into()));
        for (i, cells) in rows.iter().enumerate() {
            for (c, v) in cells.iter() {
                range.set_value((skip + 1 + i as u32, *c), v.clone());
            }
        }
        range
    }

    #[test]
    fn vending_layout_and_number_rendering() {
        let range = sheet(
            &[
                &[
                    (0, Data::Float(1.0)),
                    (1, Data::String("01.03.2024".into())),
                    (2, Data::String("*GA01*".into())),
                    (4, Data::Float(1614.7)),
                    (15, Data::Float(-20.0)),
                ],
                &[(0, Data::Int(2)), (1, Data::String("02.03.2024".into()))],
                &[],
                &[(0, Data::String("Summe".into()))],
            ],
            3,
        );
        let rows: Vec<RawRow> = SpreadsheetSource::vending(3)
            .read_range(Path::new("v.xlsx"), &range)
            .unwrap()
            .map(Result::unwrap)
            .collect();
        assert_eq!(rows.len(), 2, "stops at the first blank Nr");
        assert_eq!(rows[0].get("Nr"), Some("1"));
        assert_eq!(rows[0].get("Maschine"), Some("*GA01*"));
        assert_eq!(rows[0].get("Barumsatz"), Some("1614,7"));
        assert_eq!(rows[0].get("Ausbezahlt"), Some("-20"));
        assert_eq!(rows[0].get("Aenderung_Wechselgeld"), Some(""));
        assert_eq!(rows[0].line(), 5);
        assert_eq!(rows[1].get("Nr"), Some("2"));
    }

    #[test]
    fn wrong_row_offset_is_malformed() {
        let range = sheet(&[&[(0, Data::Float(1.0))]], 2);
        let err = SpreadsheetSource::vending(0)
            .read_range(Path::new("v.xlsx"), &range)
            .err()
            .unwrap();
        assert!(matches!(err, LedgerError::MalformedSource { .. }));
        assert!(err.to_string().contains("expected header 'Nr' in row 1"));
    }

    #[test]
    fn huge_float_is_reported_not_zeroed() {
        use crate::core::DiagnosticKind;
        use crate::normalize::{Normalizer, Vending};

        let range = sheet(
            &[&[
                (0, Data::Float(1.0)),
                (1, Data::String("01.03.2024".into())),
                (2, Data::String("GA01".into())),
                (4, Data::Float(10.0)),
                (15, Data::Float(1e30)),
            ]],
            0,
        );
        let row = SpreadsheetSource::vending(0)
            .read_range(Path::new("v.xlsx"), &range)
            .unwrap()
            .next()
            .unwrap()
            .unwrap();
        assert!(!row.get("Ausbezahlt").unwrap_or_default().is_empty());

        let diag = Vending::new("EUR", "1095", Default::default())
            .normalize(&row)
            .unwrap_err();
        assert_eq!(diag.kind, DiagnosticKind::Invalid);
        assert_eq!(diag.field, "Ausbezahlt");
    }

    #[test]
    fn narrow_sheet_is_malformed() {
        let range: Range<Data> = Range::new((0, 0), (5, 3));
        let err = SpreadsheetSource::vending(0)
            .read_range(Path::new("schmal.xlsx"), &range)
            .err()
            .unwrap();
        assert!(err.to_string().contains("expected at least 23 columns"));
    }
}
