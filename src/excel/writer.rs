//! In-place cell writer
//!
//! The workbook package is rewritten part by part: every part except the
//! edited worksheet is raw-copied, so styles, formulas, cached values and
//! other sheets keep their exact bytes. Inside the worksheet only the cells
//! named in the update list change, and they are always written as text.

use super::sheet_xml::patch_worksheet;
use crate::error::{TransferError, TransferResult};
use crate::types::CellUpdate;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use tracing::{debug, info};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";

/// Write `updates` into `sheet` of the workbook at `path`
///
/// An empty update list leaves the file untouched. The new package is
/// built in memory and then written over the original; a failure during
/// that final write may leave the file partially written.
pub fn apply_updates(path: &Path, sheet: &str, updates: &[CellUpdate]) -> TransferResult<()> {
    if updates.is_empty() {
        debug!(path = %path.display(), "no updates, file not rewritten");
        return Ok(());
    }
    if !path.exists() {
        return Err(TransferError::MissingFile(path.to_path_buf()));
    }

    let original = fs::read(path)?;
    let mut archive = ZipArchive::new(Cursor::new(original.as_slice())).map_err(|e| {
        TransferError::WorkbookIo(format!("Failed to open {}: {}", path.display(), e))
    })?;

    let part = worksheet_part(&mut archive, sheet)?.ok_or_else(|| TransferError::SheetNotFound {
        path: path.to_path_buf(),
        sheet: sheet.to_string(),
    })?;
    debug!(sheet, part = %part, "worksheet part resolved");

    let patched = rewrite_package(&mut archive, &part, updates, original.len())?;
    fs::write(path, patched).map_err(|e| {
        TransferError::WorkbookIo(format!("Failed to save {}: {}", path.display(), e))
    })?;

    info!(
        path = %path.display(),
        sheet,
        cells = updates.len(),
        "workbook updated"
    );
    Ok(())
}

/// Copy every part of `archive`, patching the worksheet stored at `part`
fn rewrite_package<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    part: &str,
    updates: &[CellUpdate],
    size_hint: usize,
) -> TransferResult<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::with_capacity(size_hint + 1024)));
    let options = FileOptions::<()>::default().compression_method(CompressionMethod::Deflated);

    let mut patched = false;
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        if file.name() == part {
            let mut xml = Vec::new();
            file.read_to_end(&mut xml)?;
            zip.start_file(part, options)?;
            zip.write_all(&patch_worksheet(&xml, updates)?)?;
            patched = true;
        } else {
            zip.raw_copy_file(file)?;
        }
    }

    if !patched {
        return Err(TransferError::WorkbookIo(format!(
            "worksheet part {} is missing from the workbook",
            part
        )));
    }
    Ok(zip.finish()?.into_inner())
}

/// Package path of the worksheet named `sheet`, `None` when there is no such sheet
fn worksheet_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    sheet: &str,
) -> TransferResult<Option<String>> {
    let workbook = read_part(archive, WORKBOOK_PART)?;
    let Some(rel_id) = sheet_relationship(&workbook, sheet)? else {
        return Ok(None);
    };

    let rels = read_part(archive, WORKBOOK_RELS_PART)?;
    let target = relationship_target(&rels, &rel_id)?.ok_or_else(|| {
        TransferError::WorkbookIo(format!(
            "sheet '{}' points at missing relationship {}",
            sheet, rel_id
        ))
    })?;
    Ok(Some(resolve_target(&target)))
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> TransferResult<Vec<u8>> {
    let mut file = archive.by_name(name)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// Relationship id of `<sheet name="...">` in workbook.xml
fn sheet_relationship(workbook: &[u8], sheet: &str) -> TransferResult<Option<String>> {
    let mut reader = Reader::from_reader(workbook);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                let mut name = None;
                let mut id = None;
                for attr in e.attributes() {
                    let attr = attr.map_err(quick_xml::Error::from)?;
                    match attr.key.local_name().as_ref() {
                        b"name" => name = Some(attr.unescape_value()?.into_owned()),
                        b"id" => id = Some(attr.unescape_value()?.into_owned()),
                        _ => {}
                    }
                }
                if name.as_deref() == Some(sheet) {
                    return Ok(id);
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

/// `Target` of the relationship with `Id == rel_id`
fn relationship_target(rels: &[u8], rel_id: &str) -> TransferResult<Option<String>> {
    let mut reader = Reader::from_reader(rels);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let mut id = None;
                let mut target = None;
                for attr in e.attributes() {
                    let attr = attr.map_err(quick_xml::Error::from)?;
                    match attr.key.local_name().as_ref() {
                        b"Id" => id = Some(attr.unescape_value()?.into_owned()),
                        b"Target" => target = Some(attr.unescape_value()?.into_owned()),
                        _ => {}
                    }
                }
                if id.as_deref() == Some(rel_id) {
                    return Ok(target);
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

/// Package path for a relationship target of xl/workbook.xml
fn resolve_target(target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments = vec!["xl"];
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}
