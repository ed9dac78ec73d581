use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that abort a run or a single operation.
///
/// Row-level problems are not errors; they are collected as
/// [`RowDiagnostic`] values and the batch continues.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LedgerError {
    /// Missing directory, unreadable or inconsistent configuration document.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The import directory contains no file matching the configured pattern.
    #[error("no files matching '{pattern}' found in {}", dir.display())]
    NoMatchingFiles {
        /// Directory that was scanned.
        dir: PathBuf,
        /// Glob-style pattern that was applied.
        pattern: String,
    },

    /// A source file does not have the expected table shape or columns.
    #[error("malformed source {}: {reason}", file.display())]
    MalformedSource {
        /// The offending file.
        file: PathBuf,
        /// What was expected and not found.
        reason: String,
    },

    /// The operator entered a value that cannot be used.
    #[error("invalid input: {0}")]
    Input(String),

    /// Filesystem failure.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Path involved in the failed operation.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// An export file already exists and the operator kept it.
    #[error("export target {} exists and was not replaced", path.display())]
    TargetExists {
        /// The existing file.
        path: PathBuf,
    },

    /// CSV reading or writing failed outside of a specific source shape.
    #[error("CSV error: {0}")]
    Csv(String),
}

impl LedgerError {
    /// Wrap an I/O error together with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Build a [`LedgerError::MalformedSource`] for `file`.
    pub fn malformed(file: &Path, reason: impl Into<String>) -> Self {
        Self::MalformedSource {
            file: file.to_path_buf(),
            reason: reason.into(),
        }
    }
}

/// Why a row was left out of the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Deliberately excluded (already paid, outside the export window, ...).
    Skipped,
    /// Failed a required-field or parse check.
    Invalid,
}

/// A single excluded row with file, line, field and reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowDiagnostic {
    /// Source file the row came from.
    pub file: PathBuf,
    /// 1-based line (CSV) or row (spreadsheet, table) number.
    pub line: usize,
    /// Column the check failed on (e.g. "Rechnungsdatum").
    pub field: String,
    /// Human-readable reason.
    pub message: String,
    /// Skipped or invalid.
    pub kind: DiagnosticKind,
}

impl RowDiagnostic {
    /// A row that failed a required-field or parse check.
    pub fn invalid(line: usize, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file: PathBuf::new(),
            line,
            field: field.into(),
            message: message.into(),
            kind: DiagnosticKind::Invalid,
        }
    }

    /// A row that was excluded on purpose.
    pub fn skipped(line: usize, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file: PathBuf::new(),
            line,
            field: field.into(),
            message: message.into(),
            kind: DiagnosticKind::Skipped,
        }
    }

    /// Attach the source file name.
    pub fn in_file(mut self, file: &Path) -> Self {
        self.file = file.to_path_buf();
        self
    }
}

impl std::fmt::Display for RowDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            DiagnosticKind::Skipped => "skipped",
            DiagnosticKind::Invalid => "invalid",
        };
        write!(
            f,
            "{}:{} [{kind}] {}: {}",
            self.file.display(),
            self.line,
            self.field,
            self.message
        )
    }
}
