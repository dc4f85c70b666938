//! `.xlsx` workbook store with one sheet per table.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use calamine::{Data, DataType, Range, Reader, open_workbook_auto};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::extract::TableKind;
use crate::models::table::{CellValue, Table};

use super::{TableSet, TableStore};

const DATETIME_NUM_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Workbook file holding the "Invoice Info", "Item Details" and "Tax Details" sheets.
///
/// Every save rewrites the whole workbook into a temporary file next to the
/// destination and renames it into place.
#[derive(Debug, Clone)]
pub struct WorkbookStore {
    path: PathBuf,
}

impl WorkbookStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn persist_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Persist {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl TableStore for WorkbookStore {
    fn load(&self) -> Result<TableSet, StoreError> {
        let mut tables = TableSet::new();
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No existing store, starting empty");
            return Ok(tables);
        }

        let mut workbook = open_workbook_auto(&self.path).map_err(|e| StoreError::Open {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        })?;
        let sheet_names = workbook.sheet_names();

        for kind in TableKind::ALL {
            let sheet = kind.sheet_name();
            if !sheet_names.iter().any(|name| name == sheet) {
                debug!(sheet, "Sheet missing from store, treating as empty");
                continue;
            }
            match workbook.worksheet_range(sheet) {
                Ok(range) => tables.set(kind, table_from_range(&range)),
                Err(e) => warn!(sheet, error = %e, "Sheet unreadable, treating as empty"),
            }
        }

        Ok(tables)
    }

    fn save(&self, tables: &TableSet) -> Result<(), StoreError> {
        let bytes = render_workbook(tables)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| self.persist_error(e))?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| self.persist_error(e))?;
        tmp.write_all(&bytes).map_err(|e| self.persist_error(e))?;
        tmp.as_file().sync_all().map_err(|e| self.persist_error(e))?;
        tmp.persist(&self.path)
            .map_err(|e| self.persist_error(e.error))?;

        info!(
            path = %self.path.display(),
            rows = ?tables.row_counts(),
            "Store written"
        );
        Ok(())
    }
}

/// First row is the header; the remaining rows are data.
fn table_from_range(range: &Range<Data>) -> Table {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Table::empty();
    };

    let columns = header
        .iter()
        .enumerate()
        .map(|(idx, cell)| match cell.as_string() {
            Some(name) if !name.trim().is_empty() => name,
            _ => format!("Unnamed: {idx}"),
        })
        .collect();

    let mut table = Table::new(columns);
    for row in rows {
        table.push_row(row.iter().map(cell_from_data).collect());
    }
    table
}

fn cell_from_data(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_datetime()
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::Text(cell.to_string())),
        other => CellValue::Text(other.to_string()),
    }
}

fn render_workbook(tables: &TableSet) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let datetime_format = Format::new().set_num_format(DATETIME_NUM_FORMAT);

    for (kind, table) in tables.iter() {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(kind.sheet_name())?;

        for (col, name) in table.columns().iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, name, &header_format)?;
        }
        for (idx, row) in table.rows().iter().enumerate() {
            let row_num = (idx + 1) as u32;
            for (col, cell) in row.iter().enumerate() {
                write_cell(worksheet, row_num, col as u16, cell, &datetime_format)?;
            }
        }
    }

    workbook.save_to_buffer()
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &CellValue,
    datetime_format: &Format,
) -> Result<(), XlsxError> {
    match cell {
        CellValue::Empty => {}
        CellValue::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        CellValue::Number(n) => {
            worksheet.write_number(row, col, *n)?;
        }
        CellValue::Text(s) => {
            worksheet.write_string(row, col, s)?;
        }
        CellValue::DateTime(dt) => {
            worksheet.write_datetime_with_format(row, col, dt, datetime_format)?;
        }
    }
    Ok(())
}
