use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::amount::{format_signed_amount, to_cents};
use super::date::DocumentDate;

/// Output columns of a DATEV batch, in their fixed order.
pub const COLUMNS: [&str; 13] = [
    "Währung",
    "VorzBetrag",
    "RechNr",
    "BelegDatum",
    "Belegtext",
    "UStSatz",
    "BU",
    "Gegenkonto",
    "Kost1",
    "Kost2",
    "Kostmenge",
    "Skonto",
    "Nachricht",
];

/// Maximum length of the description part of `Belegtext`.
pub const MAX_TEXT_LEN: usize = 60;

/// One canonical booking line.
///
/// Every source produces this exact shape; sources differ only in which
/// optional fields they fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Währung: ISO currency code of the run.
    pub currency: String,
    /// VorzBetrag: signed amount, rounded to cents.
    pub amount: Decimal,
    /// RechNr: invoice reference, empty when not applicable.
    pub invoice_ref: String,
    /// BelegDatum: day and month.
    pub document_date: DocumentDate,
    /// Belegtext: memo.
    pub document_text: String,
    /// UStSatz: tax rate code.
    pub tax_rate: Option<String>,
    /// BU: tax key.
    pub bu_key: Option<String>,
    /// Gegenkonto: counter account.
    pub counter_account: Option<String>,
    /// Kost1.
    pub cost_center_1: Option<String>,
    /// Kost2.
    pub cost_center_2: Option<String>,
    /// Kostmenge.
    pub cost_quantity: Option<String>,
    /// Skonto.
    pub discount: Option<String>,
    /// Nachricht: provenance of the automated import.
    pub message: String,
}

impl LedgerEntry {
    /// Create an entry with the mandatory fields; the amount is rounded to cents.
    pub fn new(
        currency: impl Into<String>,
        amount: Decimal,
        document_date: DocumentDate,
        document_text: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            currency: currency.into(),
            amount: to_cents(amount),
            invoice_ref: String::new(),
            document_date,
            document_text: document_text.into(),
            tax_rate: None,
            bu_key: None,
            counter_account: None,
            cost_center_1: None,
            cost_center_2: None,
            cost_quantity: None,
            discount: None,
            message: message.into(),
        }
    }

    /// Set the invoice reference.
    pub fn invoice_ref(mut self, r: impl Into<String>) -> Self {
        self.invoice_ref = r.into();
        self
    }

    /// Set the tax rate code.
    pub fn tax_rate(mut self, rate: Option<&str>) -> Self {
        self.tax_rate = rate.map(str::to_string);
        self
    }

    /// Set the counter account.
    pub fn counter_account(mut self, account: impl Into<String>) -> Self {
        self.counter_account = Some(account.into());
        self
    }

    /// Set the cost accounting passthrough fields.
    pub fn cost(
        mut self,
        center_1: Option<&str>,
        center_2: Option<&str>,
        quantity: Option<&str>,
    ) -> Self {
        self.cost_center_1 = center_1.map(str::to_string);
        self.cost_center_2 = center_2.map(str::to_string);
        self.cost_quantity = quantity.map(str::to_string);
        self
    }

    /// Set the discount passthrough.
    pub fn discount(mut self, discount: Option<&str>) -> Self {
        self.discount = discount.map(str::to_string);
        self
    }

    /// True when the amount carries no accounting meaning.
    pub fn is_zero(&self) -> bool {
        to_cents(self.amount).is_zero()
    }

    /// Period key (month digits) this entry is grouped under.
    pub fn period(&self) -> String {
        self.document_date.period()
    }

    /// The 13 output fields in [`COLUMNS`] order.
    pub fn to_record(&self) -> [String; 13] {
        let opt = |v: &Option<String>| v.clone().unwrap_or_default();
        [
            self.currency.clone(),
            format_signed_amount(self.amount),
            self.invoice_ref.clone(),
            self.document_date.token(),
            self.document_text.clone(),
            opt(&self.tax_rate),
            opt(&self.bu_key),
            opt(&self.counter_account),
            opt(&self.cost_center_1),
            opt(&self.cost_center_2),
            opt(&self.cost_quantity),
            opt(&self.discount),
            self.message.clone(),
        ]
    }
}

/// Cut `s` to at most `max` characters (not bytes).
pub fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Build a memo: the description is truncated to [`MAX_TEXT_LEN`] first,
/// then `suffix` is appended, so the suffix always survives intact.
pub fn memo(description: &str, suffix: &str) -> String {
    let mut text = truncate(description, MAX_TEXT_LEN);
    text.push_str(suffix);
    text
}
