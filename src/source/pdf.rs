use std::path::Path;

use encoding_rs::WINDOWS_1252;
use lopdf::content::Operation;
use lopdf::{Document, Object};

use super::report::{REPORT_COLUMNS, report_rows};
use super::{RawRows, SourceAdapter};
use crate::core::LedgerError;

/// Pieces whose baselines differ by at most this much share a table line.
const LINE_TOLERANCE: f64 = 2.0;

/// A gap wider than this between sorted x positions starts a new column.
const COLUMN_GAP: f64 = 20.0;

/// Bakery POS cash report (PDF).
///
/// Walks the content stream of every page, places each shown string at its
/// text position and lays the pieces out as a table: lines by baseline,
/// columns by clustering x positions across the page. Cells nothing is
/// drawn into stay blank, so column indices match the printed table as long
/// as every column has a heading or value somewhere on the page. The table
/// goes to [`report_rows`].
///
/// Strings are decoded as WinAnsi (Windows-1252), the encoding of the
/// standard fonts report generators use.
#[derive(Debug, Clone, Default)]
pub struct ReportTableSource {
    branches: Vec<String>,
}

impl ReportTableSource {
    /// Adapter recognising the given branch header markers.
    pub fn new(branches: Vec<String>) -> Self {
        Self { branches }
    }

    /// Parse a PDF already in memory.
    pub fn read_bytes(&self, file: &Path, bytes: &[u8]) -> Result<RawRows, LedgerError> {
        let doc = Document::load_mem(bytes)
            .map_err(|e| LedgerError::malformed(file, format!("failed to load PDF: {e}")))?;
        let pages = doc.get_pages();
        if pages.is_empty() {
            return Err(LedgerError::malformed(file, "PDF has no pages"));
        }

        let mut table = Vec::new();
        for (number, page_id) in pages {
            let content = doc.get_and_decode_page_content(page_id).map_err(|e| {
                LedgerError::malformed(file, format!("unreadable content on page {number}: {e}"))
            })?;
            table.extend(layout_table(page_pieces(&content.operations)));
        }
        if table.is_empty() {
            return Err(LedgerError::malformed(file, "no text on any page"));
        }
        tracing::debug!(file = %file.display(), lines = table.len(), "laid out report table");

        let rows = report_rows(file, &table, &self.branches)?;
        let headers = REPORT_COLUMNS.iter().map(|c| c.to_string()).collect();
        Ok(RawRows::from_vec(file, headers, rows))
    }
}

impl SourceAdapter for ReportTableSource {
    fn open(&self, path: &Path) -> Result<RawRows, LedgerError> {
        let bytes = std::fs::read(path).map_err(|e| LedgerError::io(path, e))?;
        self.read_bytes(path, &bytes)
    }
}

/// A string shown at one text position.
#[derive(Debug, Clone, PartialEq)]
struct Piece {
    x: f64,
    y: f64,
    text: String,
}

/// Affine matrix `[a b c d e f]` as used by PDF operators.
#[derive(Debug, Clone, Copy)]
struct Matrix([f64; 6]);

impl Matrix {
    const IDENTITY: Self = Self([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    fn translate(tx: f64, ty: f64) -> Self {
        Self([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    /// `self × other`: apply `self` first, then `other`.
    fn then(self, other: Self) -> Self {
        let [a, b, c, d, e, f] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Self([
            a * a2 + b * c2,
            a * b2 + b * d2,
            c * a2 + d * c2,
            c * b2 + d * d2,
            e * a2 + f * c2 + e2,
            e * b2 + f * d2 + f2,
        ])
    }

    fn origin(self) -> (f64, f64) {
        (self.0[4], self.0[5])
    }
}

/// Collect shown strings with their device-space start position.
///
/// Glyph widths are unknown without font metrics, so a string shown right
/// after another one without repositioning extends the previous piece.
fn page_pieces(operations: &[Operation]) -> Vec<Piece> {
    let mut ctm = Matrix::IDENTITY;
    let mut saved = Vec::new();
    let mut line = Matrix::IDENTITY;
    let mut leading = 0.0;
    let mut positioned = true;
    let mut pieces: Vec<Piece> = Vec::new();

    for op in operations {
        let args = op.operands.as_slice();
        match op.operator.as_str() {
            "q" => saved.push(ctm),
            "Q" => ctm = saved.pop().unwrap_or(Matrix::IDENTITY),
            "cm" => {
                if let Some(m) = numbers::<6>(args) {
                    ctm = Matrix(m).then(ctm);
                }
            }
            "BT" => {
                line = Matrix::IDENTITY;
                positioned = true;
            }
            "Td" | "TD" => {
                if let Some([tx, ty]) = numbers::<2>(args) {
                    if op.operator == "TD" {
                        leading = -ty;
                    }
                    line = Matrix::translate(tx, ty).then(line);
                    positioned = true;
                }
            }
            "Tm" => {
                if let Some(m) = numbers::<6>(args) {
                    line = Matrix(m);
                    positioned = true;
                }
            }
            "TL" => {
                if let Some([l]) = numbers::<1>(args) {
                    leading = l;
                }
            }
            "T*" => {
                line = Matrix::translate(0.0, -leading).then(line);
                positioned = true;
            }
            "Tj" | "TJ" | "'" | "\"" => {
                if matches!(op.operator.as_str(), "'" | "\"") {
                    line = Matrix::translate(0.0, -leading).then(line);
                    positioned = true;
                }
                let text = args.last().map(shown_text).unwrap_or_default();
                if !positioned {
                    if let Some(last) = pieces.last_mut() {
                        last.text.push_str(&text);
                        continue;
                    }
                }
                if text.trim().is_empty() {
                    continue;
                }
                let (x, y) = line.then(ctm).origin();
                pieces.push(Piece { x, y, text });
                positioned = false;
            }
            _ => {}
        }
    }
    pieces
}

fn numbers<const N: usize>(operands: &[Object]) -> Option<[f64; N]> {
    if operands.len() < N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, obj) in out.iter_mut().zip(operands) {
        *slot = match obj {
            Object::Integer(i) => *i as f64,
            Object::Real(r) => f64::from(*r),
            _ => return None,
        };
    }
    Some(out)
}

/// Text of a `Tj` string or a `TJ` array; kerning numbers are dropped.
fn shown_text(operand: &Object) -> String {
    match operand {
        Object::String(bytes, _) => WINDOWS_1252.decode_without_bom_handling(bytes).0.into_owned(),
        Object::Array(items) => items.iter().map(shown_text).collect(),
        _ => String::new(),
    }
}

/// Lay out one page's pieces as table lines, top to bottom.
fn layout_table(mut pieces: Vec<Piece>) -> Vec<Vec<String>> {
    if pieces.is_empty() {
        return Vec::new();
    }

    let mut xs: Vec<f64> = pieces.iter().map(|p| p.x).collect();
    xs.sort_by(f64::total_cmp);
    let mut starts = vec![xs[0]];
    for pair in xs.windows(2) {
        if pair[1] - pair[0] > COLUMN_GAP {
            starts.push(pair[1]);
        }
    }
    let column = |x: f64| starts.partition_point(|s| *s <= x).saturating_sub(1);

    pieces.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));
    let mut table = Vec::new();
    let mut line_y = f64::NAN;
    let mut cells: Vec<String> = Vec::new();
    for piece in pieces {
        if line_y.is_nan() || (line_y - piece.y).abs() > LINE_TOLERANCE {
            if !cells.is_empty() {
                table.push(std::mem::take(&mut cells));
            }
            cells = vec![String::new(); starts.len()];
            line_y = piece.y;
        }
        let cell = &mut cells[column(piece.x)];
        if !cell.is_empty() {
            cell.push(' ');
        }
        cell.push_str(piece.text.trim());
    }
    if !cells.is_empty() {
        table.push(cells);
    }
    table
}
