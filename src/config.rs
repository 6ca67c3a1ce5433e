//! Column and sheet naming for a processing run.
//!
//! The defaults are the layout existing workbooks already use; a YAML file
//! can override any subset of them:
//!
//! ```yaml
//! date_column: Disbursed On
//! output_sheet: Aged
//! ```

use crate::error::{AgeingError, AgeingResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_DATE_COLUMN: &str = "Date of Disbursement";
pub const DEFAULT_AGEING_COLUMN: &str = "new_ageing";
pub const DEFAULT_SLAB_COLUMN: &str = "new_slab";
pub const DEFAULT_LEGACY_AGEING_COLUMN: &str = "Ageing";
pub const DEFAULT_LEGACY_SLAB_COLUMN: &str = "Slab";
pub const DEFAULT_OUTPUT_SHEET: &str = "Processed Data";
pub const DEFAULT_OUTPUT_FILE: &str = "processed_output.xlsx";

/// Excel caps worksheet names at 31 characters.
const MAX_SHEET_NAME_LEN: usize = 31;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgeingConfig {
    pub date_column: String,
    pub ageing_column: String,
    pub slab_column: String,
    pub legacy_ageing_column: String,
    pub legacy_slab_column: String,
    pub output_sheet: String,
}

impl Default for AgeingConfig {
    fn default() -> Self {
        Self {
            date_column: DEFAULT_DATE_COLUMN.to_string(),
            ageing_column: DEFAULT_AGEING_COLUMN.to_string(),
            slab_column: DEFAULT_SLAB_COLUMN.to_string(),
            legacy_ageing_column: DEFAULT_LEGACY_AGEING_COLUMN.to_string(),
            legacy_slab_column: DEFAULT_LEGACY_SLAB_COLUMN.to_string(),
            output_sheet: DEFAULT_OUTPUT_SHEET.to_string(),
        }
    }
}

impl AgeingConfig {
    /// Load a config file, filling unspecified fields with defaults.
    pub fn load(path: &Path) -> AgeingResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: AgeingConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` when given, otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> AgeingResult<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> AgeingResult<()> {
        let names = [
            ("date_column", &self.date_column),
            ("ageing_column", &self.ageing_column),
            ("slab_column", &self.slab_column),
            ("legacy_ageing_column", &self.legacy_ageing_column),
            ("legacy_slab_column", &self.legacy_slab_column),
            ("output_sheet", &self.output_sheet),
        ];
        for (field, value) in names {
            if value.trim().is_empty() {
                return Err(AgeingError::Config(format!("'{}' must not be empty", field)));
            }
        }

        if self.ageing_column == self.slab_column {
            return Err(AgeingError::Config(format!(
                "ageing and slab columns must differ (both '{}')",
                self.ageing_column
            )));
        }
        if self.date_column == self.ageing_column || self.date_column == self.slab_column {
            return Err(AgeingError::Config(format!(
                "'{}' cannot be both the date column and an output column",
                self.date_column
            )));
        }

        if self.output_sheet.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(AgeingError::Config(format!(
                "output sheet name '{}' exceeds {} characters",
                self.output_sheet, MAX_SHEET_NAME_LEN
            )));
        }
        if let Some(c) = self
            .output_sheet
            .chars()
            .find(|c| matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        {
            return Err(AgeingError::Config(format!(
                "output sheet name '{}' contains invalid character '{}'",
                self.output_sheet, c
            )));
        }

        Ok(())
    }
}
