use chrono::{NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::fmt;

//==============================================================================
// Cell values
//==============================================================================

/// A single heterogeneous cell, as read from a worksheet or derived by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Missing value. Also the marker for a date that failed to parse.
    Empty,
    Text(String),
    Number(f64),
    Integer(i64),
    Boolean(bool),
    DateTime(NaiveDateTime),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Empty => "Empty",
            CellValue::Text(_) => "Text",
            CellValue::Number(_) => "Number",
            CellValue::Integer(_) => "Integer",
            CellValue::Boolean(_) => "Boolean",
            CellValue::DateTime(_) => "DateTime",
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            CellValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => f.write_str(&format_number(*n)),
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Boolean(b) => write!(f, "{}", b),
            CellValue::DateTime(dt) => {
                if dt.time() == NaiveTime::MIN {
                    write!(f, "{}", dt.format("%Y-%m-%d"))
                } else {
                    write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S"))
                }
            }
        }
    }
}

/// Format a number for display, removing unnecessary decimal places
pub fn format_number(n: f64) -> String {
    let rounded = (n * 1e6).round() / 1e6;
    format!("{:.6}", rounded)
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

//==============================================================================
// Tables
//==============================================================================

/// An ordered, row-oriented table with a header.
///
/// Every row holds exactly one cell per column; `push_row` pads short rows
/// with [`CellValue::Empty`] so the invariant holds for callers that build
/// tables cell by cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn with_columns<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Add a column filled with `Empty`, or return the index of the existing one.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(CellValue::Empty);
        }
        self.columns.len() - 1
    }

    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.columns.len(), CellValue::Empty);
        self.rows.push(row);
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// All values of one column, in row order.
    pub fn column_values(&self, column: &str) -> Option<Vec<&CellValue>> {
        let idx = self.column_index(column)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Append `other` below this table, unioning the column sets.
    ///
    /// New columns are added in the order `other` first mentions them; cells
    /// for columns one side lacks become `Empty`.
    pub fn append(&mut self, other: Table) {
        let mapping: Vec<usize> = other
            .columns
            .iter()
            .map(|c| self.ensure_column(c))
            .collect();
        let width = self.columns.len();

        self.rows.reserve(other.rows.len());
        for row in other.rows {
            let mut merged = vec![CellValue::Empty; width];
            for (src, value) in row.into_iter().enumerate() {
                if let Some(&dst) = mapping.get(src) {
                    merged[dst] = value;
                }
            }
            self.rows.push(merged);
        }
    }

    /// Copy of the rows at `indices` (in the given order), same columns.
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            name: self.name.clone(),
            columns: self.columns.clone(),
            rows: indices
                .iter()
                .filter_map(|&i| self.rows.get(i).cloned())
                .collect(),
        }
    }

    /// Projection onto the named columns that exist, keeping the first `limit` rows.
    pub fn preview(&self, columns: &[&str], limit: usize) -> Table {
        let present: Vec<(String, usize)> = columns
            .iter()
            .filter_map(|c| self.column_index(c).map(|i| (c.to_string(), i)))
            .collect();
        Table {
            name: self.name.clone(),
            columns: present.iter().map(|(c, _)| c.clone()).collect(),
            rows: self
                .rows
                .iter()
                .take(limit)
                .map(|r| present.iter().map(|(_, i)| r[*i].clone()).collect())
                .collect(),
        }
    }
}

//==============================================================================
// Workbooks
//==============================================================================

/// The sheets of one uploaded workbook, in workbook order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Spreadsheet {
    pub sheets: Vec<Table>,
}

impl Spreadsheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_sheet(&mut self, table: Table) {
        self.sheets.push(table);
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn total_rows(&self) -> usize {
        self.sheets.iter().map(Table::row_count).sum()
    }
}

impl From<Vec<Table>> for Spreadsheet {
    fn from(sheets: Vec<Table>) -> Self {
        Self { sheets }
    }
}
