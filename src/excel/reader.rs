//! Workbook reader - worksheet → `Dataset`

use crate::error::{TransferError, TransferResult};
use crate::types::{CellValue, Dataset};
use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read-only view of a workbook on disk
pub struct WorkbookReader {
    path: PathBuf,
    workbook: Sheets<BufReader<File>>,
}

impl WorkbookReader {
    /// Open a workbook; formula cells are read as their cached values
    pub fn open<P: AsRef<Path>>(path: P) -> TransferResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(TransferError::MissingFile(path));
        }
        let workbook = open_workbook_auto(&path).map_err(|e| {
            TransferError::WorkbookIo(format!(
                "Failed to open {} as a spreadsheet: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Self { path, workbook })
    }

    /// Sheet names in workbook order
    pub fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names().to_vec()
    }

    /// Load one sheet, first non-empty row as header
    pub fn dataset(&mut self, sheet: &str) -> TransferResult<Dataset> {
        if !self.sheet_names().iter().any(|name| name == sheet) {
            return Err(TransferError::SheetNotFound {
                path: self.path.clone(),
                sheet: sheet.to_string(),
            });
        }
        let range = self.workbook.worksheet_range(sheet).map_err(|e| {
            TransferError::WorkbookIo(format!(
                "Failed to read sheet '{}' of {}: {}",
                sheet,
                self.path.display(),
                e
            ))
        })?;
        let dataset = dataset_from_range(sheet, &range);
        debug!(
            sheet,
            rows = dataset.len(),
            columns = dataset.columns.len(),
            "loaded sheet"
        );
        Ok(dataset)
    }
}

/// Convenience: sheet names of the workbook at `path`
pub fn list_sheets<P: AsRef<Path>>(path: P) -> TransferResult<Vec<String>> {
    Ok(WorkbookReader::open(path)?.sheet_names())
}

/// Convenience: load one sheet of the workbook at `path`
pub fn read_dataset<P: AsRef<Path>>(path: P, sheet: &str) -> TransferResult<Dataset> {
    WorkbookReader::open(path)?.dataset(sheet)
}

fn dataset_from_range(sheet: &str, range: &Range<Data>) -> Dataset {
    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Dataset::new(sheet, Vec::new());
    };
    let (origin_row, origin_col) = range.start().unwrap_or((0, 0));

    let columns = header.iter().map(header_name).collect();
    let mut dataset = Dataset::new(sheet, columns).with_origin(origin_row, origin_col);
    for row in rows {
        dataset.push_row(row.iter().map(convert_cell).collect());
    }
    dataset
}

fn header_name(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Error(e.to_string()),
    }
}
