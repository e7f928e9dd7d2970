//! Blank source/target workbooks with the required header row

use crate::error::{TransferError, TransferResult};
use crate::types::Side;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::path::Path;

fn xlsx_error(e: XlsxError) -> TransferError {
    TransferError::WorkbookIo(format!("Failed to write template: {}", e))
}

/// Create `path` with one sheet holding the header row for `side`
pub fn write_template(path: &Path, side: Side, sheet: &str, force: bool) -> TransferResult<()> {
    if path.exists() && !force {
        return Err(TransferError::WorkbookIo(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet).map_err(xlsx_error)?;

    for (col, name) in side.required_columns().iter().enumerate() {
        let col = col as u16;
        worksheet
            .write_string_with_format(0, col, *name, &header)
            .map_err(xlsx_error)?;
        worksheet.set_column_width(col, 14).map_err(xlsx_error)?;
    }

    workbook.save(path).map_err(xlsx_error)?;
    Ok(())
}
