use std::path::PathBuf;
use thiserror::Error;

pub type TransferResult<T> = Result<T, TransferError>;

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("File not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Malformed settings in {}: {reason}", .path.display())]
    MalformedSettings { path: PathBuf, reason: String },

    #[error("No {0} file selected")]
    MissingSelection(&'static str),

    #[error("{dataset} sheet is missing required columns: {}", .missing.join(", "))]
    MissingColumns {
        dataset: &'static str,
        missing: Vec<String>,
    },

    #[error("Sheet '{sheet}' not found in {}", .path.display())]
    SheetNotFound { path: PathBuf, sheet: String },

    #[error("Workbook error: {0}")]
    WorkbookIo(String),

    #[error("Workbook archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Worksheet XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl TransferError {
    /// Build a `MalformedSettings` error
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        TransferError::MalformedSettings {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
