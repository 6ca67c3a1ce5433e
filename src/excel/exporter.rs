//! Excel exporter implementation

use crate::core::dates::datetime_to_excel_serial;
use crate::error::{AgeingError, AgeingResult};
use crate::types::{CellValue, Table};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::Path;
use tracing::debug;

/// Number format for datetime cells.
const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";
const DATETIME_COLUMN_WIDTH: f64 = 20.0;

/// Writes one table as the only worksheet of a new .xlsx workbook.
pub struct WorkbookExporter<'a> {
    table: &'a Table,
    sheet_name: String,
}

impl<'a> WorkbookExporter<'a> {
    /// Create a new exporter; the worksheet is named `sheet_name`
    pub fn new(table: &'a Table, sheet_name: impl Into<String>) -> Self {
        Self {
            table,
            sheet_name: sheet_name.into(),
        }
    }

    /// Export to an .xlsx file
    pub fn export(&self, output_path: &Path) -> AgeingResult<()> {
        let mut workbook = self.build()?;
        workbook
            .save(output_path)
            .map_err(|e| AgeingError::Export(format!("Failed to save Excel file: {}", e)))?;
        debug!(path = %output_path.display(), "saved workbook");
        Ok(())
    }

    /// Export to an in-memory .xlsx (e.g. for a download response)
    pub fn to_bytes(&self) -> AgeingResult<Vec<u8>> {
        let mut workbook = self.build()?;
        workbook
            .save_to_buffer()
            .map_err(|e| AgeingError::Export(format!("Failed to serialize Excel file: {}", e)))
    }

    fn build(&self) -> AgeingResult<Workbook> {
        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();
        let date_format = Format::new().set_num_format(DATETIME_FORMAT);

        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(&self.sheet_name)
            .map_err(|e| AgeingError::Export(format!("Failed to set worksheet name: {}", e)))?;

        // Header row, no index column
        for (col_idx, col_name) in self.table.columns.iter().enumerate() {
            let col = Self::column_number(col_idx)?;
            worksheet
                .write_string_with_format(0, col, col_name, &header_format)
                .map_err(|e| AgeingError::Export(format!("Failed to write header: {}", e)))?;
        }

        let mut date_columns = vec![false; self.table.column_count()];
        for (row_idx, row) in self.table.rows.iter().enumerate() {
            let excel_row = u32::try_from(row_idx + 1)
                .map_err(|_| AgeingError::Export("Too many rows for one worksheet".to_string()))?;
            for (col_idx, value) in row.iter().enumerate() {
                let col = Self::column_number(col_idx)?;
                if Self::write_cell(worksheet, excel_row, col, value, &date_format)? {
                    date_columns[col_idx] = true;
                }
            }
        }

        // Keep datetimes from rendering as ####
        for (col_idx, _) in date_columns.iter().enumerate().filter(|(_, is_date)| **is_date) {
            worksheet
                .set_column_width(Self::column_number(col_idx)?, DATETIME_COLUMN_WIDTH)
                .map_err(|e| AgeingError::Export(format!("Failed to set column width: {}", e)))?;
        }

        Ok(workbook)
    }

    /// Write a single cell; returns true when it was written as a datetime.
    fn write_cell(
        worksheet: &mut Worksheet,
        row: u32,
        col: u16,
        value: &CellValue,
        date_format: &Format,
    ) -> AgeingResult<bool> {
        let result = match value {
            CellValue::Empty => return Ok(false),
            CellValue::Text(s) => worksheet.write_string(row, col, s).map(|_| ()),
            CellValue::Number(n) => worksheet.write_number(row, col, *n).map(|_| ()),
            CellValue::Integer(i) => worksheet.write_number(row, col, *i as f64).map(|_| ()),
            CellValue::Boolean(b) => worksheet.write_boolean(row, col, *b).map(|_| ()),
            CellValue::DateTime(dt) => match datetime_to_excel_serial(*dt) {
                Some(serial) => {
                    worksheet
                        .write_number_with_format(row, col, serial, date_format)
                        .map_err(|e| {
                            AgeingError::Export(format!("Failed to write date: {}", e))
                        })?;
                    return Ok(true);
                }
                // Excel cannot represent dates before 1900
                None => worksheet.write_string(row, col, value.to_string()).map(|_| ()),
            },
        };
        result.map_err(|e| AgeingError::Export(format!("Failed to write cell: {}", e)))?;
        Ok(false)
    }

    fn column_number(idx: usize) -> AgeingResult<u16> {
        u16::try_from(idx)
            .map_err(|_| AgeingError::Export("Too many columns for one worksheet".to_string()))
    }
}
