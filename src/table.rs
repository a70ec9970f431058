//! Delimited report text to table decoding
//!
//! Report streams are rows separated by CRLF, fields separated by a single
//! delimiter character, with the column names in the first row. There is no
//! quoting or escaping: a delimiter inside a value splits the value.

use serde::Serialize;

/// Row separator used by the report streaming service
pub const ROW_SEPARATOR: &str = "\r\n";

/// A decoded report: column names plus positional data rows
///
/// Row lengths are not checked against the column count; malformed rows are
/// kept as the service sent them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table from already-split columns and rows
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    /// Decode a report stream
    ///
    /// The first row becomes the column names and every following row is a
    /// data row. Empty input yields an empty table.
    ///
    /// ```
    /// use ukg_bi::Table;
    ///
    /// let table = Table::decode("A|B\r\n1|2\r\n3|4", '|');
    /// assert_eq!(table.columns(), ["A", "B"]);
    /// assert_eq!(table.rows(), [["1", "2"], ["3", "4"]]);
    /// ```
    pub fn decode(raw: &str, delimiter: char) -> Self {
        if raw.is_empty() {
            return Self::default();
        }

        let mut lines = raw
            .split(ROW_SEPARATOR)
            .map(|line| line.split(delimiter).map(str::to_string).collect::<Vec<_>>());

        let columns = lines.next().unwrap_or_default();
        let rows = lines.collect();
        Self { columns, rows }
    }

    /// Render back to report stream form (no trailing separator)
    pub fn to_delimited(&self, delimiter: char) -> String {
        let sep = delimiter.to_string();
        std::iter::once(&self.columns)
            .chain(self.rows.iter())
            .map(|row| row.join(&sep))
            .collect::<Vec<_>>()
            .join(ROW_SEPARATOR)
    }

    /// Column names in report order (not necessarily unique)
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Data rows in report order
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when there are no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the first column with this name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Value at a data row and named column
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx).map(String::as_str)
    }

    /// Iterate rows as `(column, value)` pairs
    ///
    /// Pairing is positional and stops at the shorter of the row and the
    /// header.
    pub fn records(&self) -> impl Iterator<Item = Vec<(&str, &str)>> + '_ {
        self.rows.iter().map(move |row| {
            self.columns
                .iter()
                .zip(row)
                .map(|(c, v)| (c.as_str(), v.as_str()))
                .collect()
        })
    }

    /// Consume the table into its parts
    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<String>>) {
        (self.columns, self.rows)
    }
}
