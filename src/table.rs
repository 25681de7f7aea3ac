//! Raw tables as handed over by a reader and the resolved tables built from
//! them, plus plain-text rendering of a resolved table.

use std::borrow::Cow;
use std::fmt::{self, Write as _};

use crate::{
    catalog::NumericType,
    data::{ColumnData, Value},
    error::{Result, TableError},
};

/// Rows of tokens exactly as extracted from a source. Row 0 is the header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new<I, R, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        Self { rows }
    }

    /// Header keys; empty when the table has no rows at all.
    pub fn header(&self) -> &[String] {
        self.rows.first().map(Vec::as_slice).unwrap_or_default()
    }

    pub fn data_rows(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or_default()
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl From<Vec<Vec<String>>> for RawTable {
    fn from(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }
}

/// A raw table after schema matching, renaming and numeric coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTable {
    schema: String,
    columns: Vec<String>,
    data: Vec<ColumnData>,
    row_count: usize,
}

impl ResolvedTable {
    /// Transposes `rows` into columns labelled `columns`, then coerces each
    /// column against its declared type. Short rows are padded with empty
    /// tokens; rows longer than the header are rejected.
    pub fn from_rows(
        schema: &str,
        columns: Vec<String>,
        types: &[NumericType],
        rows: &[Vec<String>],
    ) -> Result<Self> {
        let width = columns.len();
        let mut tokens: Vec<Vec<String>> = vec![Vec::with_capacity(rows.len()); width];
        for (idx, row) in rows.iter().enumerate() {
            if row.len() > width {
                return Err(TableError::RowWidth {
                    schema: schema.to_string(),
                    row: idx + 1,
                    expected: width,
                    found: row.len(),
                });
            }
            for (col, column_tokens) in tokens.iter_mut().enumerate() {
                column_tokens.push(row.get(col).cloned().unwrap_or_default());
            }
        }
        let data = tokens
            .into_iter()
            .zip(types)
            .map(|(column_tokens, ty)| ColumnData::coerce(column_tokens, *ty))
            .collect();
        Ok(Self {
            schema: schema.to_string(),
            columns,
            data,
            row_count: rows.len(),
        })
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// First column carrying `name`.
    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        self.columns
            .iter()
            .position(|column| column == name)
            .and_then(|idx| self.data.get(idx))
    }

    pub fn column_at(&self, idx: usize) -> Option<&ColumnData> {
        self.data.get(idx)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &ColumnData)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.data.iter())
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row(&self, idx: usize) -> Option<Vec<Value>> {
        if idx >= self.row_count {
            return None;
        }
        self.data.iter().map(|column| column.value(idx)).collect()
    }

    pub fn render(&self) -> String {
        let rows = (0..self.row_count)
            .filter_map(|idx| self.row(idx))
            .map(|row| row.iter().map(Value::as_display).collect::<Vec<_>>())
            .collect::<Vec<_>>();
        render_table(&self.columns, &rows)
    }
}

impl fmt::Display for ResolvedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths = headers
        .iter()
        .map(|h| h.chars().count().max(1))
        .collect::<Vec<_>>();
    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(widths.len()) {
            widths[idx] = widths[idx].max(sanitize_cell(cell).chars().count());
        }
    }

    let mut output = String::new();
    let _ = writeln!(output, "{}", format_row(headers, &widths));

    let separator_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<_>>();
    let separator = separator_widths
        .iter()
        .map(|w| "-".repeat(*w))
        .collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator, &separator_widths));

    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths));
    }
    output
}

fn format_row(values: &[String], widths: &[usize]) -> String {
    let mut line = values
        .iter()
        .zip(widths)
        .map(|(value, width)| {
            let cell = sanitize_cell(value);
            let padding = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(padding))
        })
        .collect::<Vec<_>>()
        .join("  ");
    while line.ends_with(' ') {
        line.pop();
    }
    line
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
