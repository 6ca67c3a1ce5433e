//! Ageing Slab - disbursement ageing for multi-sheet Excel workbooks
//!
//! This library reads every sheet of an .xlsx workbook, recomputes the
//! number of days since each row's `Date of Disbursement` relative to a
//! chosen reference date, buckets rows into ageing slabs, and writes one
//! consolidated `Processed Data` sheet.
//!
//! # Features
//!
//! - All sheets flattened into one table (columns unioned, order preserved)
//! - Lenient date coercion: bad dates are reported, never dropped
//! - Fixed slab buckets: `<=60`, `>60`, `>90`, `>180`, `>365`, `No Slab`
//! - Legacy `Ageing` / `Slab` columns refreshed in place
//! - CLI (`ageing`) and HTTP API (`ageing-server`)
//!
//! # Example
//!
//! ```no_run
//! use ageing_slab::core::AgeingTransformer;
//! use ageing_slab::excel::{WorkbookExporter, WorkbookImporter};
//! use chrono::NaiveDate;
//! use std::path::Path;
//!
//! let sheets = WorkbookImporter::new("loans.xlsx").import()?;
//! let reference = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
//!
//! let outcome = AgeingTransformer::new(reference).run(sheets);
//! for warning in &outcome.warnings {
//!     println!("{}", warning);
//! }
//!
//! WorkbookExporter::new(&outcome.table, "Processed Data")
//!     .export(Path::new("processed_output.xlsx"))?;
//! # Ok::<(), ageing_slab::error::AgeingError>(())
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod excel;
pub mod types;

// Re-export commonly used types
pub use config::AgeingConfig;
pub use error::{AgeingError, AgeingResult};
pub use types::{CellValue, Spreadsheet, Table};
