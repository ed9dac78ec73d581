//! Day-first date parsing and the year-less DATEV document date.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

const DATE_FORMATS: &[&str] = &["%d.%m.%y", "%d.%m.%Y", "%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Parse a date written day-first (`15.03.2024`, `15.03.24`, `15/03/2024`),
/// ISO (`2024-03-15`), or either of those followed by a time of day.
pub fn parse_day_first(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    None
}

/// BelegDatum: day and month only, rendered as `DDMM`.
///
/// The year is implied by the export batch and deliberately dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentDate {
    day: u32,
    month: u32,
}

impl DocumentDate {
    /// Year-less document date for `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            day: date.day(),
            month: date.month(),
        }
    }

    /// Parse a `DDMM` token.
    pub fn parse_token(token: &str) -> Option<Self> {
        if token.len() != 4 || !token.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let day: u32 = token[..2].parse().ok()?;
        let month: u32 = token[2..].parse().ok()?;
        if !(1..=31).contains(&day) || !(1..=12).contains(&month) {
            return None;
        }
        Some(Self { day, month })
    }

    /// `DDMM`.
    pub fn token(&self) -> String {
        format!("{:02}{:02}", self.day, self.month)
    }

    /// Period key used for grouping: the month digits `MM`.
    pub fn period(&self) -> String {
        format!("{:02}", self.month)
    }

    /// Day of month.
    pub fn day(&self) -> u32 {
        self.day
    }

    /// Month of year.
    pub fn month(&self) -> u32 {
        self.month
    }
}

impl std::fmt::Display for DocumentDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}{:02}", self.day, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn day_first_variants() {
        assert_eq!(parse_day_first("15.03.2024"), Some(date(2024, 3, 15)));
        assert_eq!(parse_day_first("15.03.24"), Some(date(2024, 3, 15)));
        assert_eq!(parse_day_first("05/01/2024"), Some(date(2024, 1, 5)));
        assert_eq!(parse_day_first("2024-01-05"), Some(date(2024, 1, 5)));
        assert_eq!(parse_day_first("01.02.2024 13:45"), Some(date(2024, 2, 1)));
        assert_eq!(parse_day_first(" 01.02.2024 13:45:10 "), Some(date(2024, 2, 1)));
    }

    #[test]
    fn rejects_nonsense() {
        assert_eq!(parse_day_first(""), None);
        assert_eq!(parse_day_first("32.01.2024"), None);
        assert_eq!(parse_day_first("morgen"), None);
    }

    #[test]
    fn token_and_period() {
        let d = DocumentDate::from_date(date(2024, 3, 5));
        assert_eq!(d.token(), "0503");
        assert_eq!(d.period(), "03");
        assert_eq!(d.to_string(), "0503");
    }

    #[test]
    fn parse_token() {
        assert_eq!(
            DocumentDate::parse_token("2803"),
            Some(DocumentDate::from_date(date(2024, 3, 28)))
        );
        assert_eq!(DocumentDate::parse_token("2813"), None);
        assert_eq!(DocumentDate::parse_token("283"), None);
        assert_eq!(DocumentDate::parse_token("ab03"), None);
    }
}
