use thiserror::Error;

pub type AgeingResult<T> = Result<T, AgeingError>;

#[derive(Error, Debug)]
pub enum AgeingError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Import error: {0}")]
    Import(String),

    #[error("Export error: {0}")]
    Export(String),

    /// Raised when the table has no disbursement date column to age against.
    #[error("'{0}' column not found in the file.")]
    MissingColumn(String),

    #[error("Invalid reference date '{0}' (expected YYYY-MM-DD)")]
    InvalidReferenceDate(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AgeingError {
    /// True for the table-scoped schema failure that halts annotation.
    pub fn is_schema_error(&self) -> bool {
        matches!(self, AgeingError::MissingColumn(_))
    }
}
