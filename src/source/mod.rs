//! Source adapters: raw export files in, [`RawRow`]s out.
//!
//! Each adapter knows one file format and the table shape a particular
//! vendor writes into it. Rows are produced lazily where the format allows
//! it; a [`RawRows`] sequence is finite and consumed once (reopen the file to
//! read it again). Fully blank rows never reach the caller.

mod delimited;
mod discover;
#[cfg(feature = "html")]
mod html;
#[cfg(feature = "pdf")]
mod pdf;
mod report;
#[cfg(feature = "xlsx")]
mod spreadsheet;

use std::path::{Path, PathBuf};

use crate::config::{SourceConfig, SourceKind};
use crate::core::{LedgerError, RawRow};

pub use delimited::DelimitedSource;
pub use discover::find_files;
#[cfg(feature = "html")]
pub use html::{TERMINAL_COLUMNS, TerminalPageSource};
#[cfg(feature = "pdf")]
pub use pdf::ReportTableSource;
pub use report::{REPORT_COLUMNS, report_rows};
#[cfg(feature = "xlsx")]
pub use spreadsheet::{SpreadsheetSource, VENDING_COLUMNS};

/// Reads one raw export format.
pub trait SourceAdapter {
    /// Open `path` and return its rows.
    ///
    /// Fails with [`LedgerError::MalformedSource`] when the expected header
    /// or table shape is absent.
    fn open(&self, path: &Path) -> Result<RawRows, LedgerError>;
}

/// Lazy, single-pass sequence of rows from one file.
pub struct RawRows {
    file: PathBuf,
    headers: Vec<String>,
    rows: Box<dyn Iterator<Item = Result<RawRow, LedgerError>>>,
}

impl RawRows {
    /// Wrap a row iterator together with the file it came from.
    pub fn new(
        file: impl Into<PathBuf>,
        headers: Vec<String>,
        rows: impl Iterator<Item = Result<RawRow, LedgerError>> + 'static,
    ) -> Self {
        Self {
            file: file.into(),
            headers,
            rows: Box::new(rows),
        }
    }

    /// Rows that are already in memory.
    pub fn from_vec(file: impl Into<PathBuf>, headers: Vec<String>, rows: Vec<RawRow>) -> Self {
        Self::new(file, headers, rows.into_iter().map(Ok))
    }

    /// File the rows are read from.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Column names.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Fail with [`LedgerError::MalformedSource`] unless every `required`
    /// column is present.
    pub fn require_columns(&self, required: &[&str]) -> Result<(), LedgerError> {
        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|c| !self.headers.iter().any(|h| h == c))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(LedgerError::malformed(
                &self.file,
                format!("missing column(s): {}", missing.join(", ")),
            ))
        }
    }
}

impl Iterator for RawRows {
    type Item = Result<RawRow, LedgerError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.rows.next()? {
                Ok(row) if row.is_blank() => continue,
                other => return Some(other),
            }
        }
    }
}

/// Pick the adapter for a configured source.
pub fn adapter_for(source: &SourceConfig) -> Result<Box<dyn SourceAdapter>, LedgerError> {
    match source.kind {
        SourceKind::CashInvoice => Ok(Box::new(DelimitedSource::new(source.delimiter as u8))),
        #[cfg(feature = "xlsx")]
        SourceKind::Vending => Ok(Box::new(SpreadsheetSource::vending(source.starts_at_row))),
        #[cfg(feature = "pdf")]
        SourceKind::BakeryPos => Ok(Box::new(ReportTableSource::new(source.branches.clone()))),
        #[cfg(feature = "html")]
        SourceKind::CardTerminal => Ok(Box::new(TerminalPageSource::new())),
        #[allow(unreachable_patterns)]
        other => Err(LedgerError::Configuration(format!(
            "support for {} sources is not compiled in",
            other.label()
        ))),
    }
}
