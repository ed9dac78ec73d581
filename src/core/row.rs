/// One input record as read from a source: ordered column → value pairs.
///
/// Values keep the source locale (German decimal comma). Rows are immutable
/// once an adapter has produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    line: usize,
    fields: Vec<(String, String)>,
}

impl RawRow {
    /// Create a row from its 1-based line number and `(column, value)` pairs.
    pub fn new(line: usize, fields: Vec<(String, String)>) -> Self {
        Self { line, fields }
    }

    /// Pair `headers` with `values` positionally; missing values become empty.
    pub fn from_record<'a>(
        line: usize,
        headers: &[String],
        values: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let mut values = values.into_iter();
        let fields = headers
            .iter()
            .map(|h| (h.clone(), values.next().unwrap_or("").to_string()))
            .collect();
        Self { line, fields }
    }

    /// 1-based line or row number in the source.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Raw value of `column`, untouched.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == column)
            .map(|(_, v)| v.as_str())
    }

    /// Trimmed value of `column`, `None` if the column is absent or blank.
    pub fn value(&self, column: &str) -> Option<&str> {
        self.get(column).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Column names in source order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    /// True when every value is blank.
    pub fn is_blank(&self) -> bool {
        self.fields.iter().all(|(_, v)| v.trim().is_empty())
    }
}
