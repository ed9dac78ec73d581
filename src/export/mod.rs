//! DATEV batch export.
//!
//! Canonical entries are grouped into files, rendered as `;`-delimited CSV
//! with the fixed 13-column header, and written atomically. Clearing
//! mirrors, the file-name cursor of windowed sources and archiving of
//! consumed inputs live here too.
//!
//! ```
//! use chrono::NaiveDate;
//! use kassenexport::core::{DocumentDate, LedgerEntry};
//! use kassenexport::export::render_csv;
//! use rust_decimal_macros::dec;
//!
//! let day = DocumentDate::from_date(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
//! let entry = LedgerEntry::new("EUR", dec!(1614.70), day, "Kundenrechnung", "Import");
//! let csv = String::from_utf8(render_csv(&[entry]).unwrap()).unwrap();
//! assert!(csv.ends_with("EUR;+1614,70;;1503;Kundenrechnung;;;;;;;;Import\r\n"));
//! ```

mod archive;
mod batch;
mod clearing;
mod cursor;

pub use archive::{ArchiveOutcome, archive_sources, archived_name_may_contain};
pub use batch::{
    BatchExporter, FileLayout, PeriodGroup, WrittenFile, group_by_period, render_csv, span_stem,
};
pub use clearing::mirror_entries;
pub use cursor::{Timespan, last_export_end, resolve_timespan};
