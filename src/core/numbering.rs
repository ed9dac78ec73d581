use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use regex::Regex;

use super::error::LedgerError;

/// Scanner for gaps in invoice numbering across archived invoice files.
///
/// Invoice numbers are recovered from file names of the form
/// `{prefix}{digits}` (e.g. `MFR_01234.pdf`). German bookkeeping rules
/// (GoBD) expect gapless numbering, so every number between the lowest and
/// the highest one found that has no file is reported.
#[derive(Debug, Clone)]
pub struct InvoiceGapScan {
    prefixes: Vec<String>,
    digits: usize,
    filter: Option<String>,
}

/// Outcome of an [`InvoiceGapScan`].
#[derive(Debug, Clone, Default)]
pub struct GapReport {
    /// Directories that existed and were scanned.
    pub scanned_dirs: Vec<PathBuf>,
    /// Directories that were skipped because they do not exist.
    pub skipped_dirs: Vec<PathBuf>,
    /// Every invoice number found, with the prefixes it was found under.
    pub found: BTreeMap<u64, Vec<String>>,
    /// Numbers between the minimum and maximum found with no file.
    pub missing: Vec<u64>,
    /// Zero-padding width for display.
    pub digits: usize,
}

impl GapReport {
    /// Lowest and highest number found.
    pub fn range(&self) -> Option<(u64, u64)> {
        let min = self.found.keys().next()?;
        let max = self.found.keys().next_back()?;
        Some((*min, *max))
    }

    /// Zero-padded display form of `n`.
    pub fn display_number(&self, n: u64) -> String {
        format!("{:0>width$}", n, width = self.digits)
    }
}

impl InvoiceGapScan {
    /// Scan for numbers with exactly `digits` digits after any of `prefixes`.
    pub fn new(prefixes: impl IntoIterator<Item = impl Into<String>>, digits: usize) -> Self {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.trim().is_empty())
                .collect(),
            digits,
            filter: None,
        }
    }

    /// Parse comma-separated prefixes (`"MFR_, GS_"`).
    pub fn from_list(prefixes: &str, digits: usize) -> Self {
        Self::new(split_list(prefixes), digits)
    }

    /// Only consider numbers whose decimal form starts with `leading`.
    pub fn with_filter(mut self, leading: impl Into<String>) -> Self {
        let leading = leading.into();
        self.filter = if leading.trim().is_empty() {
            None
        } else {
            Some(leading.trim().to_string())
        };
        self
    }

    /// Scan `dirs` recursively and compute the gaps.
    ///
    /// Directories that do not exist are listed in
    /// [`GapReport::skipped_dirs`]; if none exists at all the scan fails with
    /// [`LedgerError::Configuration`].
    pub fn scan(&self, dirs: &[PathBuf]) -> Result<GapReport, LedgerError> {
        if self.digits == 0 {
            return Err(LedgerError::Configuration(
                "invoice number width must be at least 1".into(),
            ));
        }
        let patterns = self
            .prefixes
            .iter()
            .map(|p| {
                let re = Regex::new(&format!(r"{}(\d{{{}}})", regex::escape(p), self.digits))
                    .map_err(|e| LedgerError::Configuration(format!("bad prefix '{p}': {e}")))?;
                Ok((p.clone(), re))
            })
            .collect::<Result<Vec<_>, LedgerError>>()?;

        let mut report = GapReport {
            digits: self.digits,
            ..Default::default()
        };

        for dir in dirs {
            if !dir.is_dir() {
                tracing::warn!(dir = %dir.display(), "directory not found, skipping");
                report.skipped_dirs.push(dir.clone());
                continue;
            }
            report.scanned_dirs.push(dir.clone());

            let mut files = Vec::new();
            collect_files(dir, &mut files)?;
            for file in files {
                let Some(name) = file.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                for (prefix, re) in &patterns {
                    let Some(number) = re
                        .captures(name)
                        .and_then(|c| c.get(1))
                        .and_then(|m| m.as_str().parse::<u64>().ok())
                    else {
                        continue;
                    };
                    if !self.accepts(number) {
                        continue;
                    }
                    let seen = report.found.entry(number).or_default();
                    if !seen.contains(prefix) {
                        seen.push(prefix.clone());
                    }
                }
            }
        }

        if report.scanned_dirs.is_empty() {
            return Err(LedgerError::Configuration(
                "no valid directories found to process".into(),
            ));
        }

        if let Some((min, max)) = report.range() {
            report.missing = (min..=max)
                .filter(|n| !report.found.contains_key(n) && self.accepts(*n))
                .collect();
        }
        tracing::info!(
            found = report.found.len(),
            missing = report.missing.len(),
            "invoice gap scan finished"
        );
        Ok(report)
    }

    fn accepts(&self, number: u64) -> bool {
        match &self.filter {
            Some(leading) => number.to_string().starts_with(leading.as_str()),
            None => true,
        }
    }
}

/// Split a comma-separated list, trimming entries and dropping empty ones.
pub fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), LedgerError> {
    let entries = std::fs::read_dir(dir).map_err(|e| LedgerError::io(dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| LedgerError::io(dir, e))?.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else if path.is_file() {
            out.push(path);
        }
    }
    Ok(())
}
