//! Typed tables exchanged between the response parser and the store.

use std::collections::HashMap;
use std::fmt;
use std::io;

use chrono::NaiveDateTime;
use serde::Serialize;

/// Format used when a date-time cell is rendered as text.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single typed cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Missing value.
    Empty,
    /// Boolean value.
    Bool(bool),
    /// Numeric value.
    Number(f64),
    /// Free text.
    Text(String),
    /// Date and time without timezone.
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Check if the cell holds no value.
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => f.write_str(s),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(dt: NaiveDateTime) -> Self {
        CellValue::DateTime(dt)
    }
}

/// A table of named columns. Every row has exactly one cell per column.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// Create a table with the given columns and no rows.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Create a table with no columns and no rows.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Check if the table has neither columns nor rows.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cells of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&CellValue>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Append a row. Short rows are padded with empty cells, long rows truncated.
    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.columns.len(), CellValue::Empty);
        self.rows.push(row);
    }

    /// Set every row of `name` to `value`, adding the column at the end if needed.
    pub fn with_constant_column(mut self, name: &str, value: CellValue) -> Self {
        match self.column_index(name) {
            Some(idx) => {
                for row in &mut self.rows {
                    row[idx] = value.clone();
                }
            }
            None => {
                self.columns.push(name.to_string());
                for row in &mut self.rows {
                    row.push(value.clone());
                }
            }
        }
        self
    }

    /// Append the rows of `other` below this table's rows.
    ///
    /// Columns are aligned by name. Columns only present in `other` are added
    /// at the end and existing rows get empty cells for them; columns missing
    /// from `other` are left empty in its rows.
    pub fn append(&mut self, other: Table) {
        for name in &other.columns {
            if self.column_index(name).is_none() {
                self.columns.push(name.clone());
                for row in &mut self.rows {
                    row.push(CellValue::Empty);
                }
            }
        }

        let positions: HashMap<&str, usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();
        let targets: Vec<usize> = other
            .columns
            .iter()
            .filter_map(|name| positions.get(name.as_str()).copied())
            .collect();

        let width = self.columns.len();
        for row in other.rows {
            let mut aligned = vec![CellValue::Empty; width];
            for (value, &target) in row.into_iter().zip(&targets) {
                aligned[target] = value;
            }
            self.rows.push(aligned);
        }
    }

    /// Write the table as CSV with a header row.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> csv::Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        if !self.columns.is_empty() {
            wtr.write_record(&self.columns)?;
        }
        for row in &self.rows {
            wtr.write_record(row.iter().map(|cell| cell.to_string()))?;
        }
        wtr.flush()?;
        Ok(())
    }
}
