//! Excel import/export for the ageing pipeline
//!
//! - Import: every sheet of an .xlsx workbook → [`Spreadsheet`](crate::types::Spreadsheet)
//! - Export: the consolidated [`Table`](crate::types::Table) → single-sheet .xlsx

mod exporter;
mod importer;

pub use exporter::WorkbookExporter;
pub use importer::WorkbookImporter;
