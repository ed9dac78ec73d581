use crate::core::{DocumentDate, LedgerEntry, RawRow, RowDiagnostic};

use super::{Normalized, Normalizer, required_amount, required_date};

const MEMO: &str = "Kundenrechnung Zahlung Bar oder Karte";
const MESSAGE: &str = "Automatischer Import Bar bezahlter Rechnungen";

const COLUMNS: &[&str] = &[
    "Status",
    "Bezahlt am",
    "Rechnungs-Nr.",
    "Rechnungsdatum",
    "Rechnungsbetrag",
];

/// Invoices settled in cash or by card at the counter.
///
/// Invoices that carry a status or a payment date were settled through
/// another channel and are skipped.
#[derive(Debug, Clone)]
pub struct CashInvoice {
    currency: String,
}

impl CashInvoice {
    /// Create a normalizer writing `currency` on every entry.
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
        }
    }
}

impl Normalizer for CashInvoice {
    fn required_columns(&self) -> &'static [&'static str] {
        COLUMNS
    }

    fn message(&self) -> &'static str {
        MESSAGE
    }

    fn map_row(&self, row: &RawRow) -> Result<Normalized, RowDiagnostic> {
        for column in ["Status", "Bezahlt am"] {
            if let Some(v) = row.value(column) {
                return Err(RowDiagnostic::skipped(
                    row.line(),
                    column,
                    format!("already settled ({v})"),
                ));
            }
        }

        let date = required_date(row, "Rechnungsdatum")?;
        let amount = required_amount(row, "Rechnungsbetrag")?;

        let entry = LedgerEntry::new(
            &self.currency,
            amount,
            DocumentDate::from_date(date),
            MEMO,
            MESSAGE,
        )
        .invoice_ref(row.value("Rechnungs-Nr.").unwrap_or_default())
        .tax_rate(row.value("Steuer in %"))
        .cost(
            row.value("KOST 1"),
            row.value("KOST 2"),
            row.value("KOST-Menge"),
        )
        .discount(row.value("Skonto-Betrag"));

        Ok(Normalized {
            date,
            entries: vec![entry],
        })
    }
}
