//! File and sheet selection
//!
//! `pick` drives a [`Picker`] through the two prompts (workbook, then
//! sheet) and persists the result. Cancelling either prompt is a no-op.

use crate::error::{TransferError, TransferResult};
use crate::excel::list_sheets;
use crate::settings::{Settings, SettingsStore};
use crate::types::{Selection, Side};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Source of the user's choices
pub trait Picker {
    /// Workbook to use for `side`, `None` when cancelled
    fn pick_file(&mut self, side: Side) -> TransferResult<Option<PathBuf>>;

    /// One of `sheets`, `None` when cancelled
    fn pick_sheet(&mut self, path: &Path, sheets: &[String]) -> TransferResult<Option<String>>;
}

/// Choose a workbook and sheet for `side` and save it
///
/// Returns the refreshed settings, or `None` if the user cancelled.
pub fn pick(
    side: Side,
    picker: &mut dyn Picker,
    store: &SettingsStore,
) -> TransferResult<Option<Settings>> {
    let Some(path) = picker.pick_file(side)? else {
        info!(side = %side, "file selection cancelled");
        return Ok(None);
    };

    let sheets = list_sheets(&path)?;
    if sheets.is_empty() {
        return Err(TransferError::WorkbookIo(format!(
            "{} contains no sheets",
            path.display()
        )));
    }

    let Some(sheet) = picker.pick_sheet(&path, &sheets)? else {
        info!(side = %side, "sheet selection cancelled");
        return Ok(None);
    };
    if !sheets.contains(&sheet) {
        return Err(TransferError::SheetNotFound { path, sheet });
    }

    store.save(side, Selection::new(path, sheet)).map(Some)
}

/// Picker for the command line
///
/// Uses the FILE/`--sheet` arguments when given. Otherwise the file comes
/// from the native open dialog and the sheet from a numbered prompt.
pub struct PromptPicker<R, W> {
    file: Option<PathBuf>,
    sheet: Option<String>,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptPicker<R, W> {
    pub fn new(file: Option<PathBuf>, sheet: Option<String>, input: R, output: W) -> Self {
        Self {
            file,
            sheet,
            input,
            output,
        }
    }
}

impl<R: BufRead, W: Write> Picker for PromptPicker<R, W> {
    fn pick_file(&mut self, side: Side) -> TransferResult<Option<PathBuf>> {
        if let Some(file) = self.file.take() {
            return Ok(Some(file));
        }
        native_pick_file(side)
    }

    fn pick_sheet(&mut self, path: &Path, sheets: &[String]) -> TransferResult<Option<String>> {
        if let Some(sheet) = self.sheet.take() {
            return Ok(Some(sheet));
        }

        writeln!(self.output, "Sheets in {}:", path.display())?;
        for (idx, name) in sheets.iter().enumerate() {
            writeln!(self.output, "  {}) {}", idx + 1, name)?;
        }

        loop {
            write!(
                self.output,
                "Select sheet [1-{}] (empty to cancel): ",
                sheets.len()
            )?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            let answer = line.trim();
            if answer.is_empty() {
                return Ok(None);
            }
            if let Some(name) = sheets.iter().find(|s| s.as_str() == answer) {
                return Ok(Some(name.clone()));
            }
            match answer.parse::<usize>() {
                Ok(n) if (1..=sheets.len()).contains(&n) => return Ok(Some(sheets[n - 1].clone())),
                _ => writeln!(self.output, "'{}' is not one of the listed sheets", answer)?,
            }
        }
    }
}

#[cfg(feature = "dialog")]
fn native_pick_file(side: Side) -> TransferResult<Option<PathBuf>> {
    Ok(crate::dialog::pick_file(side))
}

#[cfg(not(feature = "dialog"))]
fn native_pick_file(_side: Side) -> TransferResult<Option<PathBuf>> {
    Err(TransferError::Io(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "no FILE given and native dialogs are disabled in this build",
    )))
}
