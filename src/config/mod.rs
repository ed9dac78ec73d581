//! Configuration document.
//!
//! A single JSON document describes every source the operator can run plus
//! the shared log file and export directory. It is loaded once and handed to
//! each component explicitly.
//!
//! ```
//! use kassenexport::config::{Config, SourceKind};
//!
//! let config = Config::from_json_str(r#"{
//!     "log_file": "kasse.log",
//!     "export_dir": "export",
//!     "sources": {
//!         "bar_re": {
//!             "kind": "cash_invoice",
//!             "import_dir": "import",
//!             "import_format": "csv",
//!             "file_matching_string": "Rechnungen",
//!             "export_filename": "datev_bar_re",
//!             "archive_filename": "verarbeitet"
//!         }
//!     }
//! }"#).unwrap();
//!
//! let source = config.source("bar_re").unwrap();
//! assert_eq!(source.kind, SourceKind::CashInvoice);
//! assert_eq!(config.currency, "EUR");
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::LedgerError;
use crate::export::archived_name_may_contain;

/// Top-level configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log file shared by all runs.
    pub log_file: PathBuf,
    /// Default export directory for sources without their own.
    pub export_dir: PathBuf,
    /// ISO currency code written to every entry.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Configured sources by name (e.g. "bar_re", "vendon").
    #[serde(default)]
    pub sources: BTreeMap<String, SourceConfig>,
}

/// The kind of export a source delivers; selects adapter and normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Invoices paid in cash or by card, CSV export of the billing system.
    CashInvoice,
    /// Vending machine cloud export, XLSX.
    Vending,
    /// Bakery POS cash report, PDF.
    BakeryPos,
    /// Cash terminal payment listing, HTML page saved from the vendor UI.
    CardTerminal,
}

impl SourceKind {
    /// Name used in log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Self::CashInvoice => "cash invoices",
            Self::Vending => "vending machines",
            Self::BakeryPos => "bakery POS report",
            Self::CardTerminal => "card terminal",
        }
    }

    /// Sources exported in consecutive date windows, resumed from the last
    /// export's file name.
    pub fn is_windowed(&self) -> bool {
        matches!(self, Self::CardTerminal)
    }
}

/// Which matching files a run consumes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
    /// Every matching file.
    #[default]
    All,
    /// Only the file whose name sorts last (cumulative exports).
    Latest,
}

/// Clearing account (Sammelkasse) routing for mirror entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearingConfig {
    /// Export label of the mirror batch.
    pub export_filename: String,
    /// Account that marks an entry as routed through the clearing account.
    #[serde(default = "default_clearing_account")]
    pub account: String,
    /// Counter account written on the mirror entries.
    pub mirror_account: String,
}

/// Settings of one source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Source kind.
    pub kind: SourceKind,
    /// Directory scanned for input files.
    pub import_dir: PathBuf,
    /// File extension of input files, without the dot.
    pub import_format: String,
    /// Substring a file name must contain. Empty matches every file.
    #[serde(default)]
    pub file_matching_string: String,
    /// Export directory; falls back to [`Config::export_dir`].
    #[serde(default)]
    pub export_dir: Option<PathBuf>,
    /// Export label, the first part of every output file name.
    pub export_filename: String,
    /// Prefix for consumed source files. Without it sources stay in place.
    #[serde(default)]
    pub archive_filename: Option<String>,
    /// Which matching files to consume.
    #[serde(default)]
    pub selection: Selection,
    /// Field delimiter of delimited sources.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Number of leading spreadsheet rows before the first data row.
    #[serde(default)]
    pub starts_at_row: usize,
    /// Display names for machine identifiers (vending).
    #[serde(default)]
    pub machines: BTreeMap<String, String>,
    /// Branch header markers in report tables (bakery POS).
    #[serde(default)]
    pub branches: Vec<String>,
    /// Allowed places (card terminal); the chosen one is embedded in names.
    #[serde(default)]
    pub places: Vec<String>,
    /// Clearing account mirror batch.
    #[serde(default)]
    pub clearing: Option<ClearingConfig>,
}

fn default_currency() -> String {
    "EUR".into()
}

fn default_clearing_account() -> String {
    "1095".into()
}

fn default_delimiter() -> char {
    ';'
}

impl Config {
    /// Read and validate the configuration document at `path`.
    pub fn from_path(path: &Path) -> Result<Self, LedgerError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            LedgerError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    /// Parse and validate a configuration document.
    pub fn from_json_str(text: &str) -> Result<Self, LedgerError> {
        let config: Config = serde_json::from_str(text)
            .map_err(|e| LedgerError::Configuration(format!("invalid config document: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Look up a source by name.
    pub fn source(&self, name: &str) -> Result<&SourceConfig, LedgerError> {
        self.sources.get(name).ok_or_else(|| {
            let known: Vec<&str> = self.sources.keys().map(String::as_str).collect();
            LedgerError::Configuration(format!(
                "unknown source '{name}' (configured: {})",
                known.join(", ")
            ))
        })
    }

    /// Export directory for `source`.
    pub fn export_dir_for<'a>(&'a self, source: &'a SourceConfig) -> &'a Path {
        source.export_dir.as_deref().unwrap_or(&self.export_dir)
    }

    /// Check internal consistency; does not touch the filesystem.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(LedgerError::Configuration(format!(
                "currency '{}' is not an ISO 4217 code",
                self.currency
            )));
        }
        for (name, source) in &self.sources {
            source
                .validate()
                .map_err(|msg| LedgerError::Configuration(format!("source '{name}': {msg}")))?;
        }
        Ok(())
    }
}

impl SourceConfig {
    fn validate(&self) -> Result<(), String> {
        if self.export_filename.trim().is_empty() {
            return Err("export_filename must not be empty".into());
        }
        if self.import_format.trim().is_empty() || self.import_format.contains('.') {
            return Err("import_format must be a bare extension like \"csv\"".into());
        }
        if !self.delimiter.is_ascii() {
            return Err(format!("delimiter '{}' is not ASCII", self.delimiter));
        }
        if let Some(archive) = &self.archive_filename {
            if archive.trim().is_empty() {
                return Err("archive_filename must not be empty".into());
            }
            // Archived names must fall outside the input pattern or the next
            // run would pick them up again.
            if self.file_matching_string.is_empty() {
                return Err("archiving needs a non-empty file_matching_string".into());
            }
            if archived_name_may_contain(archive, &self.import_format, &self.file_matching_string) {
                return Err(format!(
                    "archive_filename '{archive}' gives archived names like \
                     '{archive}_2024-01-31_23-59-59.{}' that can contain file_matching_string '{}'",
                    self.import_format, self.file_matching_string
                ));
            }
        }
        if let Some(clearing) = &self.clearing {
            if clearing.export_filename == self.export_filename {
                return Err("clearing export_filename must differ from export_filename".into());
            }
            if clearing.account == clearing.mirror_account {
                return Err("clearing account and mirror_account must differ".into());
            }
        }
        Ok(())
    }

    /// Glob-style description of the input pattern, for messages.
    pub fn pattern(&self) -> String {
        format!("*{}*.{}", self.file_matching_string, self.import_format)
    }
}

/// Builder for [`SourceConfig`].
///
/// ```
/// use kassenexport::config::{SourceConfigBuilder, SourceKind};
///
/// let source = SourceConfigBuilder::new(SourceKind::CashInvoice, "import", "csv", "datev_bar_re")
///     .file_matching_string("Rechnungen")
///     .archive_filename("verarbeitet")
///     .build();
/// assert_eq!(source.pattern(), "*Rechnungen*.csv");
/// ```
pub struct SourceConfigBuilder {
    config: SourceConfig,
}

impl SourceConfigBuilder {
    /// Start with the required fields.
    pub fn new(
        kind: SourceKind,
        import_dir: impl Into<PathBuf>,
        import_format: impl Into<String>,
        export_filename: impl Into<String>,
    ) -> Self {
        Self {
            config: SourceConfig {
                kind,
                import_dir: import_dir.into(),
                import_format: import_format.into(),
                file_matching_string: String::new(),
                export_dir: None,
                export_filename: export_filename.into(),
                archive_filename: None,
                selection: Selection::All,
                delimiter: default_delimiter(),
                starts_at_row: 0,
                machines: BTreeMap::new(),
                branches: Vec::new(),
                places: Vec::new(),
                clearing: None,
            },
        }
    }

    /// Substring input file names must contain.
    pub fn file_matching_string(mut self, s: impl Into<String>) -> Self {
        self.config.file_matching_string = s.into();
        self
    }

    /// Source-specific export directory.
    pub fn export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.export_dir = Some(dir.into());
        self
    }

    /// Archive consumed files under this prefix.
    pub fn archive_filename(mut self, s: impl Into<String>) -> Self {
        self.config.archive_filename = Some(s.into());
        self
    }

    /// File selection policy.
    pub fn selection(mut self, selection: Selection) -> Self {
        self.config.selection = selection;
        self
    }

    /// Delimiter for delimited sources.
    pub fn delimiter(mut self, d: char) -> Self {
        self.config.delimiter = d;
        self
    }

    /// First spreadsheet data row offset.
    pub fn starts_at_row(mut self, n: usize) -> Self {
        self.config.starts_at_row = n;
        self
    }

    /// Machine display name.
    pub fn machine(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.config.machines.insert(id.into(), name.into());
        self
    }

    /// Branch header marker.
    pub fn branch(mut self, marker: impl Into<String>) -> Self {
        self.config.branches.push(marker.into());
        self
    }

    /// Allowed place.
    pub fn place(mut self, place: impl Into<String>) -> Self {
        self.config.places.push(place.into());
        self
    }

    /// Clearing mirror batch.
    pub fn clearing(
        mut self,
        export_filename: impl Into<String>,
        account: impl Into<String>,
        mirror_account: impl Into<String>,
    ) -> Self {
        self.config.clearing = Some(ClearingConfig {
            export_filename: export_filename.into(),
            account: account.into(),
            mirror_account: mirror_account.into(),
        });
        self
    }

    /// Finish.
    pub fn build(self) -> SourceConfig {
        self.config
    }
}
