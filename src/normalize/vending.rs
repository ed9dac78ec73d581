use std::collections::BTreeMap;

use crate::core::{DocumentDate, LedgerEntry, RawRow, RowDiagnostic};

use super::{Normalized, Normalizer, amount_or_zero, required_date};

const MESSAGE: &str = "Automatischer Import aus vendon cloud";

const COLUMNS: &[&str] = &[
    "Datum",
    "Maschine",
    "Barumsatz",
    "Ausbezahlt",
    "Aenderung_Wechselgeld",
];

/// Vending machine daily totals.
///
/// Each row expands into up to three entries: cash revenue with its sign
/// kept, payouts (always negative) and change refills (always positive).
/// Payouts and refills move cash through the clearing account.
#[derive(Debug, Clone)]
pub struct Vending {
    currency: String,
    clearing_account: String,
    machines: BTreeMap<String, String>,
}

impl Vending {
    /// Create a normalizer booking payouts and refills against
    /// `clearing_account`, with display names for machine ids.
    pub fn new(
        currency: impl Into<String>,
        clearing_account: impl Into<String>,
        machines: BTreeMap<String, String>,
    ) -> Self {
        Self {
            currency: currency.into(),
            clearing_account: clearing_account.into(),
            machines,
        }
    }

    /// Account payouts and refills are booked against.
    pub fn clearing_account(&self) -> &str {
        &self.clearing_account
    }

    /// Display name of a machine id as exported (`*GA01*` style ids are
    /// unwrapped first).
    pub fn machine_name<'a>(&'a self, raw: &'a str) -> &'a str {
        let id = raw.trim().trim_matches('*');
        self.machines.get(id).map(String::as_str).unwrap_or(id)
    }
}

impl Normalizer for Vending {
    fn required_columns(&self) -> &'static [&'static str] {
        COLUMNS
    }

    fn message(&self) -> &'static str {
        MESSAGE
    }

    fn map_row(&self, row: &RawRow) -> Result<Normalized, RowDiagnostic> {
        let date = required_date(row, "Datum")?;
        let machine = self.machine_name(row.get("Maschine").unwrap_or_default());
        let revenue = amount_or_zero(row, "Barumsatz")?;
        let payout = amount_or_zero(row, "Ausbezahlt")?;
        let refill = amount_or_zero(row, "Aenderung_Wechselgeld")?;

        let day = DocumentDate::from_date(date);
        let entry = |amount, what: &str| {
            LedgerEntry::new(
                &self.currency,
                amount,
                day,
                format!("Automat {machine} {what}"),
                MESSAGE,
            )
        };

        let entries = vec![
            entry(revenue, "Barumsatz"),
            entry(-payout.abs(), "Auszahlung").counter_account(&self.clearing_account),
            entry(refill.abs(), "Einzahlung").counter_account(&self.clearing_account),
        ];
        Ok(Normalized { date, entries })
    }
}
