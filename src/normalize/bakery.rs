use rust_decimal::Decimal;

use crate::core::{DocumentDate, LedgerEntry, RawRow, RowDiagnostic, parse_amount, to_cents};

use super::{Normalized, Normalizer, amount_or_zero, required_date};

const MESSAGE: &str = "Automatischer Import aus CWS-Kassenbericht";

const COLUMNS: &[&str] = &[
    "Datum",
    "Filiale",
    "Bereinigter Umsatz",
    "Einnahmen 19%",
    "Einnahmen 7%",
    "Gutscheine",
];

/// Revenue columns of a branch summary and their tax rate codes.
const SPLIT: [(&str, &str); 3] = [
    ("Einnahmen 19%", "19"),
    ("Einnahmen 7%", "7"),
    ("Gutscheine", "0"),
];

/// Daily branch totals of the bakery POS, split by tax rate.
#[derive(Debug, Clone)]
pub struct BakeryPos {
    currency: String,
}

impl BakeryPos {
    /// Create a normalizer writing `currency` on every entry.
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
        }
    }
}

impl Normalizer for BakeryPos {
    fn required_columns(&self) -> &'static [&'static str] {
        COLUMNS
    }

    fn message(&self) -> &'static str {
        MESSAGE
    }

    fn map_row(&self, row: &RawRow) -> Result<Normalized, RowDiagnostic> {
        let date = required_date(row, "Datum")?;
        let branch = row.value("Filiale").unwrap_or_default();
        let day = DocumentDate::from_date(date);

        let mut entries = Vec::with_capacity(SPLIT.len());
        let mut split_sum = Decimal::ZERO;
        for (column, rate) in SPLIT {
            let amount = amount_or_zero(row, column)?;
            split_sum += amount;
            entries.push(
                LedgerEntry::new(
                    &self.currency,
                    amount,
                    day,
                    format!("T.E. {branch} {column}"),
                    MESSAGE,
                )
                .tax_rate(Some(rate)),
            );
        }

        // The report's revenue total is informational; the split is booked.
        if let Some(total) = row.value("Bereinigter Umsatz") {
            match parse_amount(total) {
                Some(total) if to_cents(total) != to_cents(split_sum) => tracing::warn!(
                    line = row.line(),
                    branch,
                    %date,
                    %total,
                    split = %split_sum,
                    "tax split does not add up to the cleaned revenue"
                ),
                None => tracing::warn!(line = row.line(), total, "unreadable cleaned revenue"),
                _ => {}
            }
        }

        Ok(Normalized { date, entries })
    }
}
