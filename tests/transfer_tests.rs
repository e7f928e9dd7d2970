//! End-to-end transfer tests against real workbooks

mod common;

use common::*;
use pretty_assertions::assert_eq;
use rack_transfer::excel::{apply_updates, list_sheets, read_dataset};
use rack_transfer::settings::{Settings, SettingsStore};
use rack_transfer::transfer;
use rack_transfer::{CellUpdate, CellValue, Selection, TransferError};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ═══════════════════════════════════════════════════════════════════════════
// HELPERS
// ═══════════════════════════════════════════════════════════════════════════

struct Books {
    _dir: TempDir,
    source: PathBuf,
    target: PathBuf,
}

impl Books {
    fn settings(&self) -> Settings {
        Settings {
            source: Some(Selection::new(&self.source, "Source")),
            target: Some(Selection::new(&self.target, "Target")),
        }
    }
}

fn books(source_rows: Vec<Vec<Cell>>, target_rows: Vec<Vec<Cell>>) -> Books {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source.xlsx");
    let target = dir.path().join("target.xlsx");
    write_book(
        &source,
        &[
            source_sheet(source_rows),
            Sheet {
                name: "Notes",
                header: &["Keep me"],
                rows: vec![vec![Text("untouched")]],
            },
        ],
    );
    write_book(&target, &[target_sheet(target_rows)]);
    Books {
        _dir: dir,
        source,
        target,
    }
}

fn source_col(path: &Path, col: usize) -> Vec<String> {
    let ds = read_dataset(path, "Source").unwrap();
    (0..ds.len()).map(|r| ds.cell(r, col).to_text()).collect()
}

// ═══════════════════════════════════════════════════════════════════════════
// RUN
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_run_copies_rack_and_marks_duplicates() {
    let books = books(
        vec![
            vec![Num(1.0), Text("A")],
            vec![Num(1.0), Text("B")],
            vec![Num(2.0), Text("C")],
        ],
        vec![vec![Num(2.0)]],
    );

    let report = transfer::run(&books.settings(), false).unwrap();
    assert_eq!(report.outcome.copied, 1);
    assert_eq!(report.outcome.duplicated, 2);

    assert_eq!(source_col(&books.source, 2), vec!["YES", "YES", ""]);
    assert_eq!(source_col(&books.source, 3), vec!["", "", "YES"]);
    assert_eq!(text_at(&books.target, "Target", 0, 1), "C");
}

#[test]
fn test_second_run_changes_nothing() {
    let books = books(
        vec![vec![Num(10.0), Text("R1")], vec![Num(11.0), Text("R2")]],
        vec![vec![Num(11.0)], vec![Num(10.0)]],
    );

    let first = transfer::run(&books.settings(), false).unwrap();
    assert_eq!(first.outcome.copied, 2);

    let second = transfer::run(&books.settings(), false).unwrap();
    assert!(second.outcome.is_empty());
    assert_eq!(second.outcome.skipped.settled, 2);
    assert_eq!(text_at(&books.target, "Target", 0, 1), "R2");
    assert_eq!(text_at(&books.target, "Target", 1, 1), "R1");
}

#[test]
fn test_dry_run_writes_nothing() {
    let books = books(vec![vec![Num(1.0), Text("A")]], vec![vec![Num(1.0)]]);

    let report = transfer::run(&books.settings(), true).unwrap();
    assert!(report.dry_run);
    assert_eq!(report.outcome.target_updates, vec![CellUpdate::new(2, 2, "A")]);
    assert_eq!(text_at(&books.target, "Target", 0, 1), "");
    assert_eq!(source_col(&books.source, 3), vec![""]);
}

#[test]
fn test_populated_target_rack_is_kept() {
    let books = books(
        vec![vec![Num(5.0), Text("NEW")]],
        vec![vec![Num(5.0), Text("OLD")]],
    );
    let report = transfer::run(&books.settings(), false).unwrap();
    assert_eq!(report.outcome.skipped.target_populated, 1);
    assert_eq!(text_at(&books.target, "Target", 0, 1), "OLD");
    assert_eq!(source_col(&books.source, 3), vec![""]);
}

#[test]
fn test_target_only_product_is_untouched() {
    let books = books(
        vec![vec![Num(1.0), Text("A")]],
        vec![vec![Num(99.0)], vec![Num(1.0)]],
    );
    transfer::run(&books.settings(), false).unwrap();
    assert_eq!(text_at(&books.target, "Target", 0, 1), "");
    assert_eq!(text_at(&books.target, "Target", 1, 1), "A");
}

#[test]
fn test_numeric_rack_id_written_as_text() {
    let books = books(vec![vec![Num(1.0), Num(404.0)]], vec![vec![Num(1.0)]]);
    transfer::run(&books.settings(), false).unwrap();
    let ds = read_dataset(&books.target, "Target").unwrap();
    assert_eq!(ds.cell(0, 1), &CellValue::Text("404".to_string()));
}

#[test]
fn test_other_sheets_survive() {
    let books = books(
        vec![vec![Num(1.0), Text("A")], vec![Num(1.0), Text("B")]],
        vec![],
    );
    transfer::run(&books.settings(), false).unwrap();
    assert_eq!(
        list_sheets(&books.source).unwrap(),
        vec!["Source".to_string(), "Notes".to_string()]
    );
    assert_eq!(text_at(&books.source, "Notes", 0, 0), "untouched");
    // Rack IDs in the source are not modified
    assert_eq!(source_col(&books.source, 1), vec!["A", "B"]);
}

// ═══════════════════════════════════════════════════════════════════════════
// FORMULAS AND FORMATTING
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_formula_product_id_reads_cached_value() {
    let books = books(vec![vec![Calc("=1+1", "2"), Text("R2")]], vec![]);
    let ds = read_dataset(&books.source, "Source").unwrap();
    assert_eq!(ds.cell(0, 0), &CellValue::Number(2.0));
}

#[test]
fn test_formula_product_id_still_matches_after_write_back() {
    let books = books(
        vec![
            vec![Calc("=1+1", "2"), Text("R2")],
            vec![Num(5.0), Text("R5")],
        ],
        vec![vec![Num(5.0)]],
    );
    let formula_cell = cell_xml(&package_part(&books.source, FIRST_SHEET_PART), "A2");

    let first = transfer::run(&books.settings(), false).unwrap();
    assert_eq!(first.outcome.copied, 1);
    assert_eq!(first.outcome.skipped.unmatched, 1);

    // The formula row was not part of the write
    let ds = read_dataset(&books.source, "Source").unwrap();
    assert_eq!(ds.cell(0, 0), &CellValue::Number(2.0));
    assert_eq!(
        cell_xml(&package_part(&books.source, FIRST_SHEET_PART), "A2"),
        formula_cell
    );

    // Product 2 now shows up in the target
    write_book(
        &books.target,
        &[target_sheet(vec![
            vec![Num(5.0), Text("R5")],
            vec![Num(2.0)],
        ])],
    );
    let second = transfer::run(&books.settings(), false).unwrap();
    assert_eq!(second.outcome.copied, 1);
    assert_eq!(text_at(&books.target, "Target", 1, 1), "R2");
    assert_eq!(source_col(&books.source, 3), vec!["YES", "YES"]);
}

#[test]
fn test_write_back_keeps_styles_and_untouched_parts() {
    let books = books(vec![vec![Num(1.0), Text("A")]], vec![vec![Num(1.0)]]);
    let styles = package_part(&books.source, "xl/styles.xml");
    let target_styles = package_part(&books.target, "xl/styles.xml");
    let notes = package_part(&books.source, SECOND_SHEET_PART);
    let sheet = package_part(&books.source, FIRST_SHEET_PART);
    let header = cell_xml(&sheet, "D1");
    assert!(header.contains(" s=\""), "bold header carries a style: {header}");

    transfer::run(&books.settings(), false).unwrap();

    assert_eq!(package_part(&books.source, "xl/styles.xml"), styles);
    assert_eq!(package_part(&books.source, SECOND_SHEET_PART), notes);
    let after = package_part(&books.source, FIRST_SHEET_PART);
    for reference in ["A1", "B1", "C1", "D1", "A2", "B2"] {
        assert_eq!(cell_xml(&after, reference), cell_xml(&sheet, reference));
    }
    assert!(cell_xml(&after, "D2").contains("<t>YES</t>"));

    assert_eq!(package_part(&books.target, "xl/styles.xml"), target_styles);
    let target_header = cell_xml(&package_part(&books.target, FIRST_SHEET_PART), "B1");
    assert!(target_header.contains(" s=\""));
}

// ═══════════════════════════════════════════════════════════════════════════
// FAILURES
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_missing_source_columns_abort_before_writing() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source.xlsx");
    let target = dir.path().join("target.xlsx");
    write_book(
        &source,
        &[Sheet {
            name: "Source",
            header: &["Product ID", "Rack ID"],
            rows: vec![vec![Num(1.0), Text("A")]],
        }],
    );
    write_book(&target, &[target_sheet(vec![vec![Num(1.0)]])]);
    let settings = Settings {
        source: Some(Selection::new(&source, "Source")),
        target: Some(Selection::new(&target, "Target")),
    };

    let err = transfer::run(&settings, false).unwrap_err();
    match err {
        TransferError::MissingColumns { dataset, missing } => {
            assert_eq!(dataset, "Source");
            assert_eq!(missing, vec!["Duplicated", "Copied"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(text_at(&target, "Target", 0, 1), "");
}

#[test]
fn test_missing_workbook_file() {
    let books = books(vec![], vec![]);
    let mut settings = books.settings();
    settings.target = Some(Selection::new(books.target.with_file_name("gone.xlsx"), "Target"));
    let err = transfer::run(&settings, false).unwrap_err();
    assert!(matches!(err, TransferError::MissingFile(_)));
}

#[test]
fn test_renamed_sheet() {
    let books = books(vec![], vec![]);
    let mut settings = books.settings();
    settings.source = Some(Selection::new(&books.source, "Renamed"));
    let err = transfer::run(&settings, false).unwrap_err();
    assert!(matches!(err, TransferError::SheetNotFound { .. }));
}

#[test]
fn test_run_requires_both_selections() {
    let settings = Settings {
        source: Some(Selection::new("a.xlsx", "A")),
        target: None,
    };
    let err = transfer::run(&settings, false).unwrap_err();
    assert!(matches!(err, TransferError::MissingSelection("target")));
}

#[test]
fn test_not_a_spreadsheet() {
    let dir = TempDir::new().unwrap();
    let bogus = dir.path().join("bogus.xlsx");
    std::fs::write(&bogus, "definitely not a zip").unwrap();
    let err = list_sheets(&bogus).unwrap_err();
    assert!(matches!(err, TransferError::WorkbookIo(_)));
}

// ═══════════════════════════════════════════════════════════════════════════
// WRITER
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_writer_changes_only_named_cells() {
    let books = books(
        vec![vec![Num(1.0), Text("A")], vec![Num(2.0), Text("B")]],
        vec![],
    );
    apply_updates(
        &books.source,
        "Source",
        &[CellUpdate::new(3, 4, "YES")],
    )
    .unwrap();

    let ds = read_dataset(&books.source, "Source").unwrap();
    assert_eq!(ds.cell(0, 0), &CellValue::Number(1.0));
    assert_eq!(ds.cell(0, 3), &CellValue::Empty);
    assert_eq!(ds.cell(1, 3), &CellValue::Text("YES".to_string()));
    assert_eq!(ds.columns, vec!["Product ID", "Rack ID", "Duplicated", "Copied"]);
}

#[test]
fn test_writer_unknown_sheet() {
    let books = books(vec![], vec![]);
    let err = apply_updates(&books.target, "Nope", &[CellUpdate::new(2, 2, "x")]).unwrap_err();
    assert!(matches!(err, TransferError::SheetNotFound { .. }));
}

#[test]
fn test_writer_empty_batch_is_noop_even_for_missing_file() {
    assert!(apply_updates(Path::new("nowhere.xlsx"), "Sheet1", &[]).is_ok());
}

// ═══════════════════════════════════════════════════════════════════════════
// SETTINGS + RUN
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_saved_settings_drive_run() {
    let books = books(vec![vec![Num(3.0), Text("Z9")]], vec![vec![Num(3.0)]]);
    let store = SettingsStore::new(books._dir.path().join("rack_transfer.yaml"));
    store
        .save(rack_transfer::Side::Source, Selection::new(&books.source, "Source"))
        .unwrap();
    let settings = store
        .save(rack_transfer::Side::Target, Selection::new(&books.target, "Target"))
        .unwrap();

    let report = transfer::run(&settings, false).unwrap();
    assert_eq!(report.outcome.copied, 1);
    assert_eq!(text_at(&books.target, "Target", 0, 1), "Z9");
}
