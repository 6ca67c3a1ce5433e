use crate::config::AgeingConfig;
use crate::core::dates::{coerce_date, days_between};
use crate::core::slab::Slab;
use crate::error::{AgeingError, AgeingResult};
use crate::types::{CellValue, Spreadsheet, Table};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};

/// Rows whose disbursement date could not be read; ageing stays undefined for them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateParseWarning {
    pub column: String,
    pub count: usize,
    /// Zero-based positions in the consolidated table.
    pub row_indices: Vec<usize>,
    pub rows: Table,
}

impl fmt::Display for DateParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Warning: There are {} rows with invalid '{}'.",
            self.count, self.column
        )
    }
}

/// Result of one processing run.
///
/// `table` is always usable output: fully annotated on success, or the
/// flattened input when `schema_error` is set.
#[derive(Debug)]
pub struct RunOutcome {
    pub table: Table,
    pub warnings: Vec<DateParseWarning>,
    pub schema_error: Option<AgeingError>,
}

impl RunOutcome {
    pub fn is_annotated(&self) -> bool {
        self.schema_error.is_none()
    }

    pub fn invalid_date_rows(&self) -> usize {
        self.warnings.iter().map(|w| w.count).sum()
    }
}

/// Recomputes ageing and slabs across all sheets of a workbook.
pub struct AgeingTransformer {
    config: AgeingConfig,
    reference_date: NaiveDate,
}

impl AgeingTransformer {
    pub fn new(reference_date: NaiveDate) -> Self {
        Self::with_config(AgeingConfig::default(), reference_date)
    }

    pub fn with_config(config: AgeingConfig, reference_date: NaiveDate) -> Self {
        Self {
            config,
            reference_date,
        }
    }

    pub fn config(&self) -> &AgeingConfig {
        &self.config
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    /// flatten → compute ageing → classify slabs → back-fill legacy columns.
    pub fn run(&self, sheets: Spreadsheet) -> RunOutcome {
        let input_rows = sheets.total_rows();
        let mut table = self.flatten(sheets);
        debug_assert_eq!(table.row_count(), input_rows);

        let warning = match self.compute_ageing(&mut table) {
            Ok(warning) => warning,
            Err(e) => {
                warn!("{}", e);
                return RunOutcome {
                    table,
                    warnings: Vec::new(),
                    schema_error: Some(e),
                };
            }
        };

        self.classify_slabs(&mut table);
        self.backfill_legacy_columns(&mut table);

        info!(
            rows = table.row_count(),
            invalid_dates = warning.as_ref().map_or(0, |w| w.count),
            "processed workbook against {}",
            self.reference_date
        );

        RunOutcome {
            table,
            warnings: warning.into_iter().collect(),
            schema_error: None,
        }
    }

    /// Concatenate all sheets into one table, coercing the date column of
    /// each sheet first. Sheet order, then row order, is preserved.
    pub fn flatten(&self, sheets: Spreadsheet) -> Table {
        let sheet_count = sheets.sheets.len();
        let table = sheets
            .sheets
            .into_iter()
            .map(|sheet| self.normalize_dates(sheet))
            .fold(Table::new(self.config.output_sheet.clone()), |mut acc, sheet| {
                acc.append(sheet);
                acc
            });
        debug!(
            sheets = sheet_count,
            rows = table.row_count(),
            columns = table.column_count(),
            "flattened sheets"
        );
        table
    }

    /// Coerce the date column of one sheet in place, if the sheet has one.
    pub fn normalize_dates(&self, mut sheet: Table) -> Table {
        if let Some(idx) = sheet.column_index(&self.config.date_column) {
            for row in &mut sheet.rows {
                row[idx] = coerce_date(&row[idx]);
            }
        }
        sheet
    }

    /// Set the ageing column from the reference date.
    ///
    /// Fails without touching the table when the date column is absent.
    /// Returns a warning listing every row whose ageing is undefined.
    pub fn compute_ageing(&self, table: &mut Table) -> AgeingResult<Option<DateParseWarning>> {
        let date_idx = table
            .column_index(&self.config.date_column)
            .ok_or_else(|| AgeingError::MissingColumn(self.config.date_column.clone()))?;
        let ageing_idx = table.ensure_column(&self.config.ageing_column);

        let mut invalid = Vec::new();
        for (i, row) in table.rows.iter_mut().enumerate() {
            row[ageing_idx] = match row[date_idx].as_datetime() {
                Some(disbursed) => CellValue::Integer(days_between(self.reference_date, disbursed)),
                None => {
                    invalid.push(i);
                    CellValue::Empty
                }
            };
        }

        if invalid.is_empty() {
            return Ok(None);
        }

        warn!(
            count = invalid.len(),
            "rows with invalid '{}'", self.config.date_column
        );
        Ok(Some(DateParseWarning {
            column: self.config.date_column.clone(),
            count: invalid.len(),
            rows: table.select_rows(&invalid),
            row_indices: invalid,
        }))
    }

    /// Set the slab column from the ageing column; rows without an ageing get `No Slab`.
    pub fn classify_slabs(&self, table: &mut Table) {
        let ageing_idx = table.column_index(&self.config.ageing_column);
        let slab_idx = table.ensure_column(&self.config.slab_column);

        for row in &mut table.rows {
            let ageing = ageing_idx.and_then(|i| row[i].as_integer());
            row[slab_idx] = CellValue::text(Slab::classify(ageing).label());
        }
    }

    /// Overwrite the legacy ageing/slab columns that are present; never creates them.
    pub fn backfill_legacy_columns(&self, table: &mut Table) {
        let pairs = [
            (&self.config.legacy_ageing_column, &self.config.ageing_column),
            (&self.config.legacy_slab_column, &self.config.slab_column),
        ];

        for (legacy, source) in pairs {
            let (Some(dst), Some(src)) = (table.column_index(legacy), table.column_index(source))
            else {
                continue;
            };
            for row in &mut table.rows {
                row[dst] = row[src].clone();
            }
            debug!("back-filled '{}' from '{}'", legacy, source);
        }
    }

    /// Row count per slab label, in slab order. Empty when the table has no slab column.
    pub fn slab_counts(&self, table: &Table) -> BTreeMap<Slab, usize> {
        let mut counts = BTreeMap::new();
        if let Some(values) = table.column_values(&self.config.slab_column) {
            for value in values {
                if let CellValue::Text(label) = value {
                    if let Some(slab) = Slab::from_label(label) {
                        *counts.entry(slab).or_insert(0) += 1;
                    }
                }
            }
        }
        counts
    }
}
