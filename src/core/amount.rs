//! German-locale monetary parsing and DATEV amount formatting.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

/// Parse a monetary string in German notation.
///
/// Accepts `"1.614,70"`, `"75,00"`, `"-12,5"` and currency-decorated values
/// such as `"1.234 €"`. Thousands separators (`.`) are removed before the
/// decimal comma is converted, so `"1.614,70"` is `1614.70` and never
/// `1.61470`. Returns `None` for blank or unparseable input.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != '€' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    let normalized = cleaned.replace('.', "").replace(',', ".");
    let normalized = normalized.strip_prefix('+').unwrap_or(&normalized);
    Decimal::from_str(normalized).ok()
}

/// Round to cents (half away from zero), the precision every exported
/// amount carries.
pub fn to_cents(d: Decimal) -> Decimal {
    d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Format as DATEV `VorzBetrag`: explicit sign, two decimals, decimal comma.
///
/// `1614.70` becomes `"+1614,70"`, `-75` becomes `"-75,00"`.
pub fn format_signed_amount(d: Decimal) -> String {
    let scaled = to_cents(d);
    let sign = if scaled >= Decimal::ZERO { '+' } else { '-' };
    let s = format!("{sign}{:.2}", scaled.abs());
    s.replace('.', ",")
}

/// Render a decimal in German notation without a sign prefix (`12,5` style,
/// trailing zeros kept as given). Used by adapters whose source cells are
/// already numeric.
pub fn to_locale_string(d: Decimal) -> String {
    d.normalize().to_string().replace('.', ",")
}
