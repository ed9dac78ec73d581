use crate::core::{DocumentDate, LedgerEntry, RawRow, RowDiagnostic, memo};

use super::{Normalized, Normalizer, required_amount, required_date};

const MESSAGE: &str = "Automatischer Import aus PM-WebMS";

const COLUMNS: &[&str] = &["Nr", "Datum", "Betrag", "Zahlart"];

/// Cash box emptying; booked on the bank side, not here.
const CASH_BOX_PAYOUT: &str = "Auszahlung in die Geldkassette";
const DEPOSIT: &str = "Einzahlung";

/// Payments at a cash terminal, netted against the clearing account.
#[derive(Debug, Clone)]
pub struct CardTerminal {
    currency: String,
    clearing_account: String,
    place: String,
}

impl CardTerminal {
    /// Create a normalizer for the terminal at `place`.
    pub fn new(
        currency: impl Into<String>,
        clearing_account: impl Into<String>,
        place: impl Into<String>,
    ) -> Self {
        Self {
            currency: currency.into(),
            clearing_account: clearing_account.into(),
            place: place.into(),
        }
    }

    /// The place this terminal stands at.
    pub fn place(&self) -> &str {
        &self.place
    }

    fn suffix(&self) -> String {
        format!(" ({}) von/zu Sammelkasse", self.place)
    }
}

impl Normalizer for CardTerminal {
    fn required_columns(&self) -> &'static [&'static str] {
        COLUMNS
    }

    fn message(&self) -> &'static str {
        MESSAGE
    }

    fn map_row(&self, row: &RawRow) -> Result<Normalized, RowDiagnostic> {
        let kind = row.value("Zahlart").unwrap_or_default();
        if kind == CASH_BOX_PAYOUT {
            return Err(RowDiagnostic::skipped(row.line(), "Zahlart", kind));
        }
        let date = required_date(row, "Datum")?;
        let amount = required_amount(row, "Betrag")?.abs();
        let amount = if kind == DEPOSIT { amount } else { -amount };

        let entry = LedgerEntry::new(
            &self.currency,
            amount,
            DocumentDate::from_date(date),
            memo(kind, &self.suffix()),
            MESSAGE,
        )
        .counter_account(&self.clearing_account);

        Ok(Normalized {
            date,
            entries: vec![entry],
        })
    }

    /// Swap the clearing suffix for the terminal side of the movement.
    fn mirror_text(&self, text: &str) -> String {
        match text.strip_suffix(&self.suffix()) {
            Some(kind) => format!("{kind} in/von PM-Kassenautomaten-{}", self.place),
            None => text.to_string(),
        }
    }
}
