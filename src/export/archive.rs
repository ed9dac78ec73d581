use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

const STAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Shape of a rendered [`STAMP_FORMAT`], `#` for any digit.
const STAMP_SHAPE: &str = "####-##-##_##-##-##";

/// Result of archiving the consumed sources of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveOutcome {
    /// `(original, archived)` paths.
    pub archived: Vec<(PathBuf, PathBuf)>,
    /// Sources that were exported but could not be renamed, with the reason.
    pub unarchived: Vec<(PathBuf, String)>,
}

/// Rename each file to `{label}_{YYYY-MM-DD}_{HH-MM-SS}[_{n}].{ext}` in its
/// own directory.
///
/// A failing rename does not stop the others; it is logged and listed in
/// [`ArchiveOutcome::unarchived`] for manual reconciliation.
pub fn archive_sources(files: &[PathBuf], label: &str, stamp: NaiveDateTime) -> ArchiveOutcome {
    let mut outcome = ArchiveOutcome::default();
    for file in files {
        match archive_one(file, label, stamp) {
            Ok(target) => {
                tracing::info!(from = %file.display(), to = %target.display(), "archived source");
                outcome.archived.push((file.clone(), target));
            }
            Err(reason) => {
                tracing::warn!(file = %file.display(), %reason, "exported but not archived");
                outcome.unarchived.push((file.clone(), reason));
            }
        }
    }
    outcome
}

fn archive_one(file: &Path, label: &str, stamp: NaiveDateTime) -> Result<PathBuf, String> {
    let dir = file.parent().unwrap_or_else(|| Path::new("."));
    let ext = file
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    let base = format!("{label}_{}", stamp.format(STAMP_FORMAT));

    let target = (0u32..)
        .map(|n| match n {
            0 => dir.join(format!("{base}{ext}")),
            n => dir.join(format!("{base}_{n}{ext}")),
        })
        .find(|p| !p.exists())
        .ok_or_else(|| "no free archive name".to_string())?;

    std::fs::rename(file, &target).map_err(|e| e.to_string())?;
    Ok(target)
}

/// Whether `needle` can occur in a name [`archive_sources`] gives a file
/// with extension `ext` under `label`, for any time stamp and counter.
pub fn archived_name_may_contain(label: &str, ext: &str, needle: &str) -> bool {
    let needle: Vec<char> = needle.chars().collect();
    if needle.is_empty() {
        return true;
    }
    // A counter longer than the needle adds no new windows.
    (0..=needle.len()).any(|digits| {
        let counter = match digits {
            0 => String::new(),
            n => format!("_{}", "#".repeat(n)),
        };
        let shape: Vec<Option<char>> = label
            .chars()
            .map(Some)
            .chain(
                format!("_{STAMP_SHAPE}{counter}")
                    .chars()
                    .map(|c| (c != '#').then_some(c)),
            )
            .chain(format!(".{ext}").chars().map(Some))
            .collect();
        shape.windows(needle.len()).any(|window| {
            window.iter().zip(&needle).all(|(slot, ch)| match slot {
                Some(fixed) => fixed == ch,
                None => ch.is_ascii_digit(),
            })
        })
    })
}
