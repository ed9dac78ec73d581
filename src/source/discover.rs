use std::path::PathBuf;

use crate::config::{Selection, SourceConfig};
use crate::core::LedgerError;

/// List the input files of `source`: names containing the matching string
/// with the configured extension, sorted by name, reduced to the newest one
/// for [`Selection::Latest`].
///
/// A missing import directory is a configuration error; an empty result is
/// [`LedgerError::NoMatchingFiles`].
pub fn find_files(source: &SourceConfig) -> Result<Vec<PathBuf>, LedgerError> {
    let dir = &source.import_dir;
    if !dir.is_dir() {
        tracing::error!(dir = %dir.display(), "import directory does not exist");
        return Err(LedgerError::Configuration(format!(
            "directory {} does not exist",
            dir.display()
        )));
    }

    let suffix = format!(".{}", source.import_format.to_ascii_lowercase());
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| LedgerError::io(dir, e))? {
        let path = entry.map_err(|e| LedgerError::io(dir, e))?.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.to_ascii_lowercase().ends_with(&suffix)
            && name.contains(&source.file_matching_string)
        {
            files.push(path);
        }
    }
    files.sort();

    if source.selection == Selection::Latest {
        if let Some(latest) = files.pop() {
            files = vec![latest];
        }
    }

    if files.is_empty() {
        return Err(LedgerError::NoMatchingFiles {
            dir: dir.clone(),
            pattern: source.pattern(),
        });
    }
    tracing::info!(count = files.len(), files = ?files, "found matching files");
    Ok(files)
}
