use std::borrow::Cow;
use std::io::Cursor;
use std::path::Path;

use csv::{ReaderBuilder, Trim};

use super::{RawRows, SourceAdapter};
use crate::core::{LedgerError, RawRow};

/// Delimited text with a header row (billing system CSV exports).
///
/// Files are decoded as UTF-8, falling back to Windows-1252 for exports
/// written by older German office software. A UTF-8 BOM is ignored.
#[derive(Debug, Clone)]
pub struct DelimitedSource {
    delimiter: u8,
}

impl Default for DelimitedSource {
    fn default() -> Self {
        Self { delimiter: b';' }
    }
}

impl DelimitedSource {
    /// Adapter for the given field delimiter.
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Read rows from in-memory content; `file` is used for error messages.
    pub fn read_bytes(&self, file: &Path, bytes: &[u8]) -> Result<RawRows, LedgerError> {
        let text = decode(bytes);
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(Trim::Headers)
            .from_reader(Cursor::new(text.into_owned().into_bytes()));

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| LedgerError::malformed(file, format!("cannot read header row: {e}")))?
            .iter()
            .map(str::to_string)
            .collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(LedgerError::malformed(file, "empty header row"));
        }

        let owned_file = file.to_path_buf();
        let row_headers = headers.clone();
        let rows = reader.into_records().enumerate().map(move |(i, record)| {
            let record = record.map_err(|e| {
                LedgerError::malformed(&owned_file, format!("unreadable record: {e}"))
            })?;
            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(i + 2);
            Ok(RawRow::from_record(line, &row_headers, record.iter()))
        });
        Ok(RawRows::new(file, headers, rows))
    }
}

impl SourceAdapter for DelimitedSource {
    fn open(&self, path: &Path) -> Result<RawRows, LedgerError> {
        let bytes = std::fs::read(path).map_err(|e| LedgerError::io(path, e))?;
        self.read_bytes(path, &bytes)
    }
}

fn decode(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => {
            let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            text
        }
    }
}
