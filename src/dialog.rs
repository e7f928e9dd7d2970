//! Native dialogs (rfd)

use crate::excel::SPREADSHEET_EXTENSIONS;
use crate::types::Side;
use rfd::{FileDialog, MessageButtons, MessageDialog, MessageLevel};
use std::path::PathBuf;

/// Blocking open dialog restricted to Excel workbooks
pub fn pick_file(side: Side) -> Option<PathBuf> {
    FileDialog::new()
        .set_title(format!("Choose {} Excel File", side.title()))
        .add_filter("Excel files", &SPREADSHEET_EXTENSIONS)
        .pick_file()
}

/// Blocking success/error message box
pub fn notify(title: &str, message: &str, is_error: bool) {
    let level = if is_error {
        MessageLevel::Error
    } else {
        MessageLevel::Info
    };
    MessageDialog::new()
        .set_level(level)
        .set_title(title)
        .set_description(message)
        .set_buttons(MessageButtons::Ok)
        .show();
}
