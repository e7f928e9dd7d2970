//! Excel workbook access
//!
//! - Reader: worksheet → `Dataset` (calamine, cached formula values)
//! - Writer: `CellUpdate`s applied in place (zip + quick-xml, untouched parts raw-copied)
//! - Template: blank workbooks with the required headers (rust_xlsxwriter)

mod reader;
mod sheet_xml;
mod template;
mod writer;

pub use reader::{list_sheets, read_dataset, WorkbookReader};
pub use template::write_template;
pub use writer::apply_updates;

/// Extensions offered by the file picker
pub const SPREADSHEET_EXTENSIONS: [&str; 2] = ["xlsx", "xlsm"];
