use crate::error::{TransferError, TransferResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

//==============================================================================
// Column names and markers
//==============================================================================

pub const PRODUCT_ID: &str = "Product ID";
pub const RACK_ID: &str = "Rack ID";
pub const DUPLICATED: &str = "Duplicated";
pub const COPIED: &str = "Copied";

/// Marker written into the Duplicated and Copied columns
pub const YES: &str = "YES";

pub const SOURCE_COLUMNS: [&str; 4] = [PRODUCT_ID, RACK_ID, DUPLICATED, COPIED];
pub const TARGET_COLUMNS: [&str; 2] = [PRODUCT_ID, RACK_ID];

//==============================================================================
// Selection
//==============================================================================

/// Which of the two workbooks a selection belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Side {
    Source,
    Target,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Source => "source",
            Side::Target => "target",
        }
    }

    /// Capitalized name used in labels and error messages
    pub fn title(&self) -> &'static str {
        match self {
            Side::Source => "Source",
            Side::Target => "Target",
        }
    }

    /// Required header columns for this side's sheet
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            Side::Source => &SOURCE_COLUMNS,
            Side::Target => &TARGET_COLUMNS,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A workbook file plus the sheet chosen inside it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Selection {
    pub file_path: PathBuf,
    pub sheet_name: String,
}

impl Selection {
    pub fn new(file_path: impl Into<PathBuf>, sheet_name: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            sheet_name: sheet_name.into(),
        }
    }

    /// "basename - sheet", as shown in the status labels
    pub fn label(&self) -> String {
        let base = self
            .file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file_path.display().to_string());
        format!("{} - {}", base, self.sheet_name)
    }
}

//==============================================================================
// Tabular data
//==============================================================================

/// A single scalar read from a worksheet cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Spreadsheet error value such as `#N/A`
    Error(String),
}

static EMPTY: CellValue = CellValue::Empty;

impl CellValue {
    /// Empty cell or whitespace-only text
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// True when the cell holds the `YES` marker
    pub fn is_yes(&self) -> bool {
        matches!(self, CellValue::Text(s) if s == YES)
    }

    /// Text form written into target cells
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Bool(true) => "TRUE".to_string(),
            CellValue::Bool(false) => "FALSE".to_string(),
            CellValue::Error(e) => e.clone(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_string())
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

/// One worksheet loaded as a header plus rows
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub sheet_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
    /// 0-based (row, column) of the header's first cell in the sheet
    pub origin: (u32, u32),
}

impl Dataset {
    pub fn new(sheet_name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            columns,
            rows: Vec::new(),
            origin: (0, 0),
        }
    }

    pub fn with_origin(mut self, row: u32, column: u32) -> Self {
        self.origin = (row, column);
        self
    }

    /// Append a row, padding or truncating it to the header width
    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.columns.len(), CellValue::Empty);
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the first column with this header name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.trim() == name)
    }

    /// Resolve every required column or report all the missing ones
    pub fn require_columns(
        &self,
        dataset: &'static str,
        names: &[&str],
    ) -> TransferResult<Vec<usize>> {
        let mut found = Vec::with_capacity(names.len());
        let mut missing = Vec::new();
        for name in names {
            match self.column_index(name) {
                Some(idx) => found.push(idx),
                None => missing.push(name.to_string()),
            }
        }
        if missing.is_empty() {
            Ok(found)
        } else {
            Err(TransferError::MissingColumns { dataset, missing })
        }
    }

    pub fn cell(&self, row: usize, column: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&EMPTY)
    }

    pub fn set_cell(&mut self, row: usize, column: usize, value: CellValue) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(column)) {
            *cell = value;
        }
    }

    /// 1-based sheet row of data row `row`
    pub fn physical_row(&self, row: usize) -> u32 {
        self.origin.0 + row as u32 + 2
    }

    /// 1-based sheet column of dataset column `column`
    pub fn physical_column(&self, column: usize) -> u32 {
        self.origin.1 + column as u32 + 1
    }

    /// Reflect written updates in memory, as if the sheet had been reloaded
    pub fn apply_updates(&mut self, updates: &[CellUpdate]) {
        for update in updates {
            let (Some(row), Some(column)) = (
                (update.row as usize).checked_sub(self.origin.0 as usize + 2),
                (update.column as usize).checked_sub(self.origin.1 as usize + 1),
            ) else {
                continue;
            };
            self.set_cell(row, column, CellValue::from(update.value.as_str()));
        }
    }
}

//==============================================================================
// Updates
//==============================================================================

/// Write instruction for one physical cell (both coordinates 1-based)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellUpdate {
    pub row: u32,
    pub column: u32,
    pub value: String,
}

impl CellUpdate {
    pub fn new(row: u32, column: u32, value: impl Into<String>) -> Self {
        Self {
            row,
            column,
            value: value.into(),
        }
    }
}
