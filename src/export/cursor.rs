//! Export cursor recovered from file names.
//!
//! Windowed sources name their exports `{label}[_{place}]_{start}_{end}.csv`.
//! The greatest `end` found in the export directory is the watermark; the
//! next run starts one day later and ends yesterday.

use std::path::Path;

use chrono::{Days, NaiveDate};
use regex::Regex;

use super::batch::span_stem;
use crate::core::LedgerError;
use crate::operator::Operator;

/// Inclusive date window of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timespan {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Timespan {
    /// True when `date` lies inside the window.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// End date of the most recent export of `label` (and `place`) in `dir`.
///
/// A missing directory has no exports.
pub fn last_export_end(
    dir: &Path,
    label: &str,
    place: Option<&str>,
) -> Result<Option<NaiveDate>, LedgerError> {
    if !dir.is_dir() {
        return Ok(None);
    }
    let pattern = format!(
        r"^{}_(\d{{4}}-\d{{2}}-\d{{2}})_(\d{{4}}-\d{{2}}-\d{{2}})\.csv$",
        regex::escape(&span_stem(label, place))
    );
    let re = Regex::new(&pattern)
        .map_err(|e| LedgerError::Configuration(format!("invalid export label '{label}': {e}")))?;

    let mut latest: Option<NaiveDate> = None;
    for entry in std::fs::read_dir(dir).map_err(|e| LedgerError::io(dir, e))? {
        let entry = entry.map_err(|e| LedgerError::io(dir, e))?;
        let name = entry.file_name();
        let Some(caps) = name.to_str().and_then(|n| re.captures(n)) else {
            continue;
        };
        let Ok(end) = NaiveDate::parse_from_str(&caps[2], "%Y-%m-%d") else {
            continue;
        };
        if latest.is_none_or(|l| end > l) {
            latest = Some(end);
        }
    }
    Ok(latest)
}

/// Window of the next run, or `None` when there are no new days.
///
/// Without a previous export the operator is asked for a start date
/// (`YYYY-MM-DD`). The end is always the day before `today`.
pub fn resolve_timespan(
    dir: &Path,
    label: &str,
    place: Option<&str>,
    today: NaiveDate,
    operator: &mut dyn Operator,
) -> Result<Option<Timespan>, LedgerError> {
    let end = today
        .checked_sub_days(Days::new(1))
        .ok_or_else(|| LedgerError::Input(format!("no day before {today}")))?;

    let start = match last_export_end(dir, label, place)? {
        Some(last) => {
            tracing::info!(%last, "found previous export");
            last.checked_add_days(Days::new(1))
                .ok_or_else(|| LedgerError::Input(format!("no day after {last}")))?
        }
        None => {
            let answer = operator.prompt("Enter start date (YYYY-MM-DD):")?;
            NaiveDate::parse_from_str(answer.trim(), "%Y-%m-%d").map_err(|_| {
                tracing::error!(%answer, "invalid start date");
                LedgerError::Input(format!("invalid start date '{answer}', use YYYY-MM-DD"))
            })?
        }
    };

    if start > end {
        tracing::info!(%start, %end, "no new days to export");
        return Ok(None);
    }
    Ok(Some(Timespan { start, end }))
}
