//! Fixture workbooks for the integration tests

#![allow(dead_code)]

use rust_xlsxwriter::{Format, Formula, Workbook};
use std::io::Read;
use std::path::Path;

pub const SOURCE_HEADER: [&str; 4] = ["Product ID", "Rack ID", "Duplicated", "Copied"];
pub const TARGET_HEADER: [&str; 2] = ["Product ID", "Rack ID"];

/// Package parts of the first and second worksheet
pub const FIRST_SHEET_PART: &str = "xl/worksheets/sheet1.xml";
pub const SECOND_SHEET_PART: &str = "xl/worksheets/sheet2.xml";

/// One fixture cell
#[derive(Clone, Copy)]
pub enum Cell {
    Text(&'static str),
    Num(f64),
    /// Formula and its cached result
    Calc(&'static str, &'static str),
    Blank,
}

pub use Cell::{Blank, Calc, Num, Text};

/// A named sheet: header row plus data rows
pub struct Sheet<'a> {
    pub name: &'a str,
    pub header: &'a [&'a str],
    pub rows: Vec<Vec<Cell>>,
}

/// Write `sheets` into a new workbook at `path`
pub fn write_book(path: &Path, sheets: &[Sheet<'_>]) {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet.name).unwrap();
        for (col, name) in sheet.header.iter().enumerate() {
            worksheet
                .write_string_with_format(0, col as u16, *name, &bold)
                .unwrap();
        }
        for (r, row) in sheet.rows.iter().enumerate() {
            let r = r as u32 + 1;
            for (c, cell) in row.iter().enumerate() {
                let c = c as u16;
                match cell {
                    Text(s) => {
                        worksheet.write_string(r, c, *s).unwrap();
                    }
                    Num(n) => {
                        worksheet.write_number(r, c, *n).unwrap();
                    }
                    Calc(formula, result) => {
                        worksheet
                            .write_formula(r, c, Formula::new(*formula).set_result(*result))
                            .unwrap();
                    }
                    Blank => {}
                }
            }
        }
    }
    workbook.save(path).unwrap();
}

pub fn source_sheet(rows: Vec<Vec<Cell>>) -> Sheet<'static> {
    Sheet {
        name: "Source",
        header: &SOURCE_HEADER,
        rows,
    }
}

pub fn target_sheet(rows: Vec<Vec<Cell>>) -> Sheet<'static> {
    Sheet {
        name: "Target",
        header: &TARGET_HEADER,
        rows,
    }
}

/// Text of a data cell after reloading (row/col are 0-based data positions)
pub fn text_at(path: &Path, sheet: &str, row: usize, col: usize) -> String {
    let ds = rack_transfer::excel::read_dataset(path, sheet).unwrap();
    ds.cell(row, col).to_text()
}

/// Raw XML of one package part
pub fn package_part(path: &Path, name: &str) -> String {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut part = archive.by_name(name).unwrap();
    let mut xml = String::new();
    part.read_to_string(&mut xml).unwrap();
    xml
}

/// The `<c>` element for `reference` in a worksheet part
pub fn cell_xml(sheet_xml: &str, reference: &str) -> String {
    let open = format!("<c r=\"{}\"", reference);
    let start = sheet_xml
        .find(&open)
        .unwrap_or_else(|| panic!("no cell {reference} in worksheet"));
    let rest = &sheet_xml[start..];
    let tag_end = rest.find('>').unwrap();
    let end = if rest[..tag_end].ends_with('/') {
        tag_end + 1
    } else {
        rest.find("</c>").unwrap() + "</c>".len()
    };
    rest[..end].to_string()
}
