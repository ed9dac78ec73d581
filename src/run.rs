//! One export run of a configured source.
//!
//! Discovery, the preview gate, cursor resolution, normalization, export
//! and archival, in that order. Every input file is read and normalized
//! before the first export is written, so a malformed source aborts the run
//! without output; sources are archived only after all exports succeeded.

use std::fmt;
use std::path::PathBuf;

use chrono::{Local, NaiveDate, NaiveDateTime};

use crate::config::{Config, SourceConfig, SourceKind};
use crate::core::{LedgerEntry, LedgerError, RowDiagnostic};
use crate::export::{
    BatchExporter, FileLayout, Timespan, WrittenFile, archive_sources, mirror_entries,
    resolve_timespan,
};
use crate::normalize::{Normalizer, SourceProfile};
use crate::operator::Operator;
use crate::source::{adapter_for, find_files};

/// How a run ended without an error.
#[derive(Debug)]
pub enum RunOutcome {
    /// The operator did not confirm processing; nothing was touched.
    Declined,
    /// No new days or no non-zero entries; nothing was written.
    NothingToExport {
        reason: String,
        diagnostics: Vec<RowDiagnostic>,
    },
    /// Exports were written.
    Exported(RunReport),
}

/// What an exporting run did.
#[derive(Debug, Default)]
pub struct RunReport {
    pub source: String,
    pub window: Option<Timespan>,
    pub files_read: Vec<PathBuf>,
    pub written: Vec<WrittenFile>,
    pub diagnostics: Vec<RowDiagnostic>,
    pub archived: Vec<(PathBuf, PathBuf)>,
    /// Exported but not archived; needs manual attention.
    pub unarchived: Vec<(PathBuf, String)>,
}

impl RunReport {
    /// Entries over all written files.
    pub fn entries_written(&self) -> usize {
        self.written.iter().map(|w| w.entries).sum()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {} file(s) read, {} entries in {} export file(s)",
            self.source,
            self.files_read.len(),
            self.entries_written(),
            self.written.len()
        )?;
        if let Some(w) = &self.window {
            writeln!(f, "  window {} to {}", w.start, w.end)?;
        }
        for w in &self.written {
            writeln!(f, "  wrote {} ({} entries)", w.path.display(), w.entries)?;
        }
        for d in &self.diagnostics {
            writeln!(f, "  {d}")?;
        }
        for (from, to) in &self.archived {
            writeln!(f, "  archived {} -> {}", from.display(), to.display())?;
        }
        for (file, reason) in &self.unarchived {
            writeln!(f, "  NOT ARCHIVED {}: {reason}", file.display())?;
        }
        Ok(())
    }
}

/// A run of one source, configured before [`Run::execute`].
pub struct Run<'a> {
    config: &'a Config,
    name: String,
    source: &'a SourceConfig,
    place: Option<String>,
    now: NaiveDateTime,
}

impl<'a> Run<'a> {
    /// Prepare a run of the source called `name`, clocked at local time.
    pub fn new(config: &'a Config, name: &str) -> Result<Self, LedgerError> {
        Ok(Self {
            config,
            name: name.to_string(),
            source: config.source(name)?,
            place: None,
            now: Local::now().naive_local(),
        })
    }

    /// Place of a card terminal source.
    pub fn place(mut self, place: impl Into<String>) -> Self {
        self.place = Some(place.into());
        self
    }

    /// Run clock; decides "yesterday" and the time stamps in file names.
    pub fn at(mut self, now: NaiveDateTime) -> Self {
        self.now = now;
        self
    }

    pub fn execute(&self, operator: &mut dyn Operator) -> Result<RunOutcome, LedgerError> {
        let source = self.source;
        let profile = SourceProfile::from_config(self.config, source, self.place.as_deref())?;
        let place = match &profile {
            SourceProfile::CardTerminal(t) => Some(t.place().to_string()),
            _ => None,
        };
        tracing::info!(source = %self.name, kind = source.kind.label(), at = %self.now, "starting run");

        let files = find_files(source)?;
        let export_dir = self.config.export_dir_for(source);

        let window = if source.kind.is_windowed() {
            let span = resolve_timespan(
                export_dir,
                &source.export_filename,
                place.as_deref(),
                self.now.date(),
                operator,
            )?;
            match span {
                Some(span) => Some(span),
                None => {
                    return Ok(RunOutcome::NothingToExport {
                        reason: "no new days to export".into(),
                        diagnostics: Vec::new(),
                    });
                }
            }
        } else {
            None
        };

        if !operator.confirm(&preview(source, &files))? {
            tracing::info!(source = %self.name, "operator declined, nothing processed");
            return Ok(RunOutcome::Declined);
        }

        let Collected {
            entries,
            dates,
            diagnostics,
        } = self.collect(&profile, &files, window)?;

        let (Some(first), Some(last)) = (dates.iter().min().copied(), dates.iter().max().copied())
        else {
            return Ok(nothing(diagnostics));
        };
        if entries.is_empty() {
            return Ok(nothing(diagnostics));
        }

        let layout = match source.kind {
            SourceKind::CashInvoice => FileLayout::Monthly { stamp: self.now },
            _ => {
                let (start, end) = window.map_or((first, last), |w| (w.start, w.end));
                FileLayout::Span { place, start, end }
            }
        };

        let mirrors = source
            .clearing
            .as_ref()
            .map(|c| (c, mirror_entries(&entries, c, &profile)));

        let mut written = BatchExporter::new(export_dir, &source.export_filename, layout.clone())
            .export(entries, operator)?;
        if let Some((clearing, mirrors)) = mirrors {
            tracing::info!(entries = mirrors.len(), label = %clearing.export_filename, "clearing mirrors");
            written.extend(
                BatchExporter::new(export_dir, &clearing.export_filename, layout)
                    .export(mirrors, operator)?,
            );
        }

        let mut report = RunReport {
            source: self.name.clone(),
            window,
            files_read: files.clone(),
            written,
            diagnostics,
            ..Default::default()
        };
        match &source.archive_filename {
            Some(label) => {
                let outcome = archive_sources(&files, label, self.now);
                report.archived = outcome.archived;
                report.unarchived = outcome.unarchived;
            }
            None => tracing::info!("no archive name configured, sources left in place"),
        }

        tracing::info!(
            source = %self.name,
            files = report.files_read.len(),
            entries = report.entries_written(),
            diagnostics = report.diagnostics.len(),
            unarchived = report.unarchived.len(),
            "run finished"
        );
        Ok(RunOutcome::Exported(report))
    }

    fn collect(
        &self,
        profile: &SourceProfile,
        files: &[PathBuf],
        window: Option<Timespan>,
    ) -> Result<Collected, LedgerError> {
        let adapter = adapter_for(self.source)?;
        let mut out = Collected::default();

        for file in files {
            tracing::info!(file = %file.display(), "processing file");
            let rows = adapter.open(file)?;
            rows.require_columns(profile.required_columns())?;

            let before = out.entries.len();
            for row in rows {
                let row = row?;
                let diagnostic = match profile.normalize(&row) {
                    Ok(n) => match window {
                        Some(w) if !w.contains(n.date) => RowDiagnostic::skipped(
                            row.line(),
                            "Datum",
                            format!("{} is outside {} to {}", n.date, w.start, w.end),
                        ),
                        _ => {
                            out.dates.push(n.date);
                            out.entries.extend(n.entries);
                            continue;
                        }
                    },
                    Err(d) => d,
                };
                let diagnostic = diagnostic.in_file(file);
                tracing::warn!(%diagnostic, "row excluded");
                out.diagnostics.push(diagnostic);
            }
            tracing::info!(
                file = %file.display(),
                entries = out.entries.len() - before,
                "normalized file"
            );
        }
        Ok(out)
    }
}

#[derive(Default)]
struct Collected {
    entries: Vec<LedgerEntry>,
    dates: Vec<NaiveDate>,
    diagnostics: Vec<RowDiagnostic>,
}

fn nothing(diagnostics: Vec<RowDiagnostic>) -> RunOutcome {
    tracing::info!(diagnostics = diagnostics.len(), "no entries to export");
    RunOutcome::NothingToExport {
        reason: "no entries to export".into(),
        diagnostics,
    }
}

fn preview(source: &SourceConfig, files: &[PathBuf]) -> String {
    let mut text = format!(
        "Found {} file(s) matching {} in {}:",
        files.len(),
        source.pattern(),
        source.import_dir.display()
    );
    for f in files {
        text.push_str(&format!("\n  {}", f.display()));
    }
    text.push_str("\nProcess these files?");
    text
}
