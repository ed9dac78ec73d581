//! Canonical ledger types, German-locale parsing, errors, and the invoice
//! numbering gap check.
//!
//! Everything downstream of a source adapter speaks in these types:
//! [`RawRow`] in, [`LedgerEntry`] out, [`RowDiagnostic`] for rows that were
//! left behind.

mod amount;
mod date;
mod entry;
mod error;
mod numbering;
mod row;

pub use amount::{format_signed_amount, parse_amount, to_cents, to_locale_string};
pub use date::{DocumentDate, parse_day_first};
pub use entry::{COLUMNS, LedgerEntry, MAX_TEXT_LEN, memo, truncate};
pub use error::*;
pub use numbering::{GapReport, InvoiceGapScan, split_list};
pub use row::RawRow;
