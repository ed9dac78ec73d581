//! Row normalization: [`RawRow`] in, canonical [`LedgerEntry`] values out.
//!
//! Every source kind has a profile implementing [`Normalizer`]. A profile is
//! chosen once per run through [`SourceProfile::from_config`]; after that
//! rows are mapped one by one. Rows that fail a required-field check come
//! back as a [`RowDiagnostic`] and never abort the batch.

mod bakery;
mod cash_invoice;
mod terminal;
mod vending;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::config::{Config, SourceConfig, SourceKind};
use crate::core::{LedgerEntry, LedgerError, RawRow, RowDiagnostic, parse_amount, parse_day_first};

pub use bakery::BakeryPos;
pub use cash_invoice::CashInvoice;
pub use terminal::CardTerminal;
pub use vending::Vending;

/// Counter account of entries routed through the clearing account when the
/// source does not configure one.
pub const DEFAULT_CLEARING_ACCOUNT: &str = "1095";

/// Entries produced from one row together with the row's full date.
///
/// The date keeps its year; exporters use it for the run window and for
/// span-named files, while entries only carry day and month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub date: NaiveDate,
    pub entries: Vec<LedgerEntry>,
}

/// Maps one source's rows into ledger entries.
pub trait Normalizer {
    /// Columns the adapter must deliver for this profile.
    fn required_columns(&self) -> &'static [&'static str];

    /// Provenance written to `Nachricht`.
    fn message(&self) -> &'static str;

    /// Map a row without zero filtering.
    fn map_row(&self, row: &RawRow) -> Result<Normalized, RowDiagnostic>;

    /// Memo of the clearing mirror of an entry with memo `text`.
    fn mirror_text(&self, text: &str) -> String {
        text.to_string()
    }

    /// Map a row; entries whose amount rounds to zero are dropped.
    fn normalize(&self, row: &RawRow) -> Result<Normalized, RowDiagnostic> {
        let mut normalized = self.map_row(row)?;
        normalized.entries.retain(|entry| {
            if entry.is_zero() {
                tracing::trace!(line = row.line(), text = %entry.document_text, "dropping zero amount");
                false
            } else {
                true
            }
        });
        Ok(normalized)
    }
}

/// The normalizer of a configured source.
#[derive(Debug, Clone)]
pub enum SourceProfile {
    CashInvoice(CashInvoice),
    Vending(Vending),
    BakeryPos(BakeryPos),
    CardTerminal(CardTerminal),
}

impl SourceProfile {
    /// Build the profile for `source`.
    ///
    /// Card terminal sources need a `place`; when the source lists allowed
    /// places it must be one of them. Other kinds ignore `place`.
    pub fn from_config(
        config: &Config,
        source: &SourceConfig,
        place: Option<&str>,
    ) -> Result<Self, LedgerError> {
        let currency = config.currency.clone();
        let clearing_account = source
            .clearing
            .as_ref()
            .map(|c| c.account.clone())
            .unwrap_or_else(|| DEFAULT_CLEARING_ACCOUNT.to_string());

        Ok(match source.kind {
            SourceKind::CashInvoice => Self::CashInvoice(CashInvoice::new(currency)),
            SourceKind::Vending => Self::Vending(Vending::new(
                currency,
                clearing_account,
                source.machines.clone(),
            )),
            SourceKind::BakeryPos => Self::BakeryPos(BakeryPos::new(currency)),
            SourceKind::CardTerminal => {
                let place = resolve_place(source, place)?;
                Self::CardTerminal(CardTerminal::new(currency, clearing_account, place))
            }
        })
    }

    fn inner(&self) -> &dyn Normalizer {
        match self {
            Self::CashInvoice(p) => p,
            Self::Vending(p) => p,
            Self::BakeryPos(p) => p,
            Self::CardTerminal(p) => p,
        }
    }
}

impl Normalizer for SourceProfile {
    fn required_columns(&self) -> &'static [&'static str] {
        self.inner().required_columns()
    }

    fn message(&self) -> &'static str {
        self.inner().message()
    }

    fn map_row(&self, row: &RawRow) -> Result<Normalized, RowDiagnostic> {
        self.inner().map_row(row)
    }

    fn mirror_text(&self, text: &str) -> String {
        self.inner().mirror_text(text)
    }
}

fn resolve_place(source: &SourceConfig, place: Option<&str>) -> Result<String, LedgerError> {
    let Some(place) = place.map(|p| p.trim().to_lowercase()).filter(|p| !p.is_empty()) else {
        return Err(LedgerError::Configuration(format!(
            "{} sources need a place (configured: {})",
            source.kind.label(),
            source.places.join(", ")
        )));
    };
    if !source.places.is_empty() && !source.places.iter().any(|p| p.to_lowercase() == place) {
        return Err(LedgerError::Input(format!(
            "invalid place '{place}', use one of: {}",
            source.places.join(", ")
        )));
    }
    Ok(place)
}

/// A required date column.
pub(crate) fn required_date(row: &RawRow, column: &str) -> Result<NaiveDate, RowDiagnostic> {
    let raw = row
        .value(column)
        .ok_or_else(|| RowDiagnostic::invalid(row.line(), column, "missing value"))?;
    parse_day_first(raw).ok_or_else(|| {
        RowDiagnostic::invalid(row.line(), column, format!("cannot parse date '{raw}'"))
    })
}

/// A required amount column.
pub(crate) fn required_amount(row: &RawRow, column: &str) -> Result<Decimal, RowDiagnostic> {
    let raw = row
        .value(column)
        .ok_or_else(|| RowDiagnostic::invalid(row.line(), column, "missing value"))?;
    parse(row, column, raw)
}

/// An amount column where blank means zero.
pub(crate) fn amount_or_zero(row: &RawRow, column: &str) -> Result<Decimal, RowDiagnostic> {
    match row.value(column) {
        None => Ok(Decimal::ZERO),
        Some(raw) => parse(row, column, raw),
    }
}

fn parse(row: &RawRow, column: &str, raw: &str) -> Result<Decimal, RowDiagnostic> {
    parse_amount(raw).ok_or_else(|| {
        RowDiagnostic::invalid(row.line(), column, format!("cannot parse amount '{raw}'"))
    })
}
