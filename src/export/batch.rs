use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use csv::{Terminator, WriterBuilder};
use tempfile::NamedTempFile;

use crate::core::{COLUMNS, LedgerEntry, LedgerError};
use crate::operator::Operator;

/// How export files are split and named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileLayout {
    /// One file per month: `{label}_Monat-{MM}_{YYYY-MM-DD}_{HH-MM-SS}.csv`.
    Monthly {
        /// Run time stamped into every name.
        stamp: NaiveDateTime,
    },
    /// One file for the whole window: `{label}[_{place}]_{start}_{end}.csv`.
    Span {
        place: Option<String>,
        start: NaiveDate,
        end: NaiveDate,
    },
}

impl FileLayout {
    /// File name for `label` and the group's period (ignored by `Span`).
    pub fn file_name(&self, label: &str, period: Option<&str>) -> String {
        match self {
            Self::Monthly { stamp } => format!(
                "{label}_Monat-{}_{}.csv",
                period.unwrap_or("00"),
                stamp.format("%Y-%m-%d_%H-%M-%S")
            ),
            Self::Span { place, start, end } => {
                format!("{}_{start}_{end}.csv", span_stem(label, place.as_deref()))
            }
        }
    }
}

/// `{label}` or `{label}_{place}`: the name prefix of span exports.
pub fn span_stem(label: &str, place: Option<&str>) -> String {
    match place {
        Some(place) => format!("{label}_{place}"),
        None => label.to_string(),
    }
}

/// Entries written to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodGroup {
    /// Month digits, `None` for a span export.
    pub period: Option<String>,
    pub entries: Vec<LedgerEntry>,
}

/// Group entries by the month of their document date, in month order.
/// Entry order inside a group is kept.
pub fn group_by_period(entries: Vec<LedgerEntry>) -> Vec<PeriodGroup> {
    let mut groups: BTreeMap<String, Vec<LedgerEntry>> = BTreeMap::new();
    for entry in entries {
        groups.entry(entry.period()).or_default().push(entry);
    }
    groups
        .into_iter()
        .map(|(period, entries)| PeriodGroup {
            period: Some(period),
            entries,
        })
        .collect()
}

/// Render entries as a DATEV batch: header row, `;` delimited, CRLF.
pub fn render_csv(entries: &[LedgerEntry]) -> Result<Vec<u8>, LedgerError> {
    let mut writer = WriterBuilder::new()
        .delimiter(b';')
        .terminator(Terminator::CRLF)
        .from_writer(Vec::new());
    let csv_err = |e: csv::Error| LedgerError::Csv(e.to_string());
    writer.write_record(COLUMNS).map_err(csv_err)?;
    for entry in entries {
        writer.write_record(entry.to_record()).map_err(csv_err)?;
    }
    writer
        .into_inner()
        .map_err(|e| LedgerError::Csv(e.error().to_string()))
}

/// A file the exporter wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub period: Option<String>,
    pub entries: usize,
}

/// Writes entries of one label into an export directory.
#[derive(Debug, Clone)]
pub struct BatchExporter {
    dir: PathBuf,
    label: String,
    layout: FileLayout,
}

impl BatchExporter {
    /// Create an exporter writing `{label}_...` files into `dir`.
    pub fn new(dir: impl Into<PathBuf>, label: impl Into<String>, layout: FileLayout) -> Self {
        Self {
            dir: dir.into(),
            label: label.into(),
            layout,
        }
    }

    /// Target paths and their groups, without touching the filesystem.
    pub fn plan(&self, entries: Vec<LedgerEntry>) -> Vec<(PathBuf, PeriodGroup)> {
        let groups = match self.layout {
            FileLayout::Monthly { .. } => group_by_period(entries),
            FileLayout::Span { .. } => vec![PeriodGroup {
                period: None,
                entries,
            }],
        };
        groups
            .into_iter()
            .filter(|g| !g.entries.is_empty())
            .map(|g| {
                let name = self.layout.file_name(&self.label, g.period.as_deref());
                (self.dir.join(name), g)
            })
            .collect()
    }

    /// Write one file per non-empty group.
    ///
    /// An existing file is only replaced when the operator confirms;
    /// otherwise the export stops with [`LedgerError::TargetExists`]. Files
    /// written before the refusal stay in place.
    pub fn export(
        &self,
        entries: Vec<LedgerEntry>,
        operator: &mut dyn Operator,
    ) -> Result<Vec<WrittenFile>, LedgerError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| LedgerError::io(&self.dir, e))?;

        let mut written = Vec::new();
        for (path, group) in self.plan(entries) {
            if path.exists() {
                let question = format!("{} already exists. Overwrite?", path.display());
                if !operator.confirm(&question)? {
                    tracing::warn!(path = %path.display(), "kept existing export");
                    return Err(LedgerError::TargetExists { path });
                }
            }
            let bytes = render_csv(&group.entries)?;
            write_atomic(&path, &bytes)?;
            tracing::info!(
                path = %path.display(),
                entries = group.entries.len(),
                period = group.period.as_deref().unwrap_or("-"),
                "wrote export"
            );
            written.push(WrittenFile {
                path,
                period: group.period,
                entries: group.entries.len(),
            });
        }
        Ok(written)
    }
}

/// Write via a temporary file in the target directory, synced, then renamed.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), LedgerError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| LedgerError::io(dir, e))?;
    tmp.write_all(bytes).map_err(|e| LedgerError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| LedgerError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| LedgerError::io(path, e.error))?;
    Ok(())
}
