//! Excel importer implementation - Excel (.xlsx) → Spreadsheet

use crate::core::dates::parse_date_text;
use crate::error::{AgeingError, AgeingResult};
use crate::types::{CellValue, Spreadsheet, Table};
use calamine::{open_workbook, Data, ExcelDateTime, Range, Reader, Xlsx};
use chrono::{NaiveDate, NaiveDateTime};
use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads every sheet of an .xlsx workbook into header-keyed tables.
pub struct WorkbookImporter {
    path: PathBuf,
}

impl WorkbookImporter {
    /// Create a new importer for the workbook at `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Import the workbook, one table per sheet in workbook order
    pub fn import(&self) -> AgeingResult<Spreadsheet> {
        let mut workbook: Xlsx<_> = open_workbook(&self.path).map_err(|e| {
            AgeingError::Import(format!(
                "Failed to open Excel file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        Self::read_sheets(&mut workbook)
    }

    /// Import a workbook already held in memory (e.g. an HTTP upload)
    pub fn import_bytes(bytes: &[u8]) -> AgeingResult<Spreadsheet> {
        let mut workbook = Xlsx::new(Cursor::new(bytes))
            .map_err(|e| AgeingError::Import(format!("Failed to read Excel data: {}", e)))?;
        Self::read_sheets(&mut workbook)
    }

    fn read_sheets<RS: Read + Seek>(workbook: &mut Xlsx<RS>) -> AgeingResult<Spreadsheet> {
        let mut spreadsheet = Spreadsheet::new();

        for sheet_name in workbook.sheet_names() {
            let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
                AgeingError::Import(format!("Failed to read sheet '{}': {}", sheet_name, e))
            })?;
            let table = Self::sheet_to_table(&sheet_name, &range);
            debug!(
                sheet = %sheet_name,
                rows = table.row_count(),
                columns = table.column_count(),
                "imported sheet"
            );
            spreadsheet.add_sheet(table);
        }

        Ok(spreadsheet)
    }

    /// Convert one worksheet: first row is the header, the rest are records.
    fn sheet_to_table(sheet_name: &str, range: &Range<Data>) -> Table {
        let mut rows = range.rows();
        let Some(header) = rows.next() else {
            return Table::new(sheet_name);
        };

        let mut table = Table::with_columns(sheet_name, Self::header_names(header));
        for row in rows {
            table.push_row(row.iter().map(Self::convert_cell).collect());
        }

        // Ranges can extend past the last record (formatted but blank cells)
        while table
            .rows
            .last()
            .is_some_and(|r| r.iter().all(CellValue::is_empty))
        {
            table.rows.pop();
        }

        table
    }

    /// Header names, verbatim: blanks become `Unnamed: {index}`, repeats get a `.N` suffix.
    fn header_names(cells: &[Data]) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(cells.len());

        for (idx, cell) in cells.iter().enumerate() {
            let base = match Self::convert_cell(cell) {
                CellValue::Text(s) => s,
                CellValue::Empty => format!("Unnamed: {}", idx),
                CellValue::Boolean(b) => (if b { "True" } else { "False" }).to_string(),
                other => other.to_string(),
            };

            let mut name = base.clone();
            let mut suffix = 1;
            while names.contains(&name) {
                name = format!("{}.{}", base, suffix);
                suffix += 1;
            }
            names.push(name);
        }

        names
    }

    /// Datetime of a date-formatted cell, honouring the workbook's 1900/1904 epoch.
    ///
    /// `None` for serials with no calendar date (time-only values, 1900-02-29).
    fn workbook_datetime(dt: &ExcelDateTime) -> Option<NaiveDateTime> {
        let (year, month, day, hour, minute, second, milli) = dt.to_ymd_hms_milli();
        NaiveDate::from_ymd_opt(year.into(), month.into(), day.into())?.and_hms_milli_opt(
            hour.into(),
            minute.into(),
            second.into(),
            milli.into(),
        )
    }

    /// Convert a calamine cell to a [`CellValue`]
    fn convert_cell(cell: &Data) -> CellValue {
        match cell {
            Data::Empty => CellValue::Empty,
            Data::String(s) if s.is_empty() => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Int(i) => CellValue::Integer(*i),
            Data::Float(f) => CellValue::Number(*f),
            Data::Bool(b) => CellValue::Boolean(*b),
            Data::DateTime(dt) if dt.is_duration() => CellValue::Number(dt.as_f64()),
            Data::DateTime(dt) => Self::workbook_datetime(dt)
                .map_or(CellValue::Number(dt.as_f64()), CellValue::DateTime),
            Data::DateTimeIso(s) => {
                parse_date_text(s).map_or_else(|| CellValue::Text(s.clone()), CellValue::DateTime)
            }
            Data::DurationIso(s) => CellValue::Text(s.clone()),
            Data::Error(e) => CellValue::Text(e.to_string()),
        }
    }
}
