//! Cell edits applied to one worksheet XML part
//!
//! The part is streamed event by event. Rows and cells that are not named
//! in the update list are written back exactly as read; edited cells keep
//! their `s` (style) attribute and become inline strings.

use crate::error::{TransferError, TransferResult};
use crate::types::CellUpdate;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::BTreeMap;
use std::io::BufRead;

type RowCells<'a> = Vec<(u32, &'a str)>;

/// Edits grouped by row, consumed in sheet order
struct RowQueue<'a> {
    rows: Vec<(u32, RowCells<'a>)>,
    next: usize,
}

impl<'a> RowQueue<'a> {
    fn new(updates: &'a [CellUpdate]) -> Self {
        let mut grouped: BTreeMap<u32, BTreeMap<u32, &'a str>> = BTreeMap::new();
        for update in updates {
            grouped
                .entry(update.row)
                .or_default()
                .insert(update.column, update.value.as_str());
        }
        Self {
            rows: grouped
                .into_iter()
                .map(|(row, cells)| (row, cells.into_iter().collect()))
                .collect(),
            next: 0,
        }
    }

    /// Next queued row numbered below `limit`
    fn pop_before(&mut self, limit: u32) -> Option<(u32, RowCells<'a>)> {
        match self.rows.get_mut(self.next) {
            Some((row, cells)) if *row < limit => {
                self.next += 1;
                Some((*row, std::mem::take(cells)))
            }
            _ => None,
        }
    }

    fn pop_at(&mut self, row: u32) -> Option<RowCells<'a>> {
        match self.rows.get_mut(self.next) {
            Some((queued, cells)) if *queued == row => {
                self.next += 1;
                Some(std::mem::take(cells))
            }
            _ => None,
        }
    }
}

/// Rewrite `xml` with `updates` applied
pub(crate) fn patch_worksheet(xml: &[u8], updates: &[CellUpdate]) -> TransferResult<Vec<u8>> {
    let extent = updates
        .iter()
        .fold((0, 0), |(r, c), u| (r.max(u.row), c.max(u.column)));
    let mut queue = RowQueue::new(updates);

    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut writer = Writer::new(Vec::with_capacity(xml.len() + updates.len() * 64));

    let mut buf = Vec::new();
    let mut saw_sheet_data = false;
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Empty(e) if local_name(e.name().as_ref()) == b"dimension" => {
                writer.write_event(Event::Empty(widen_dimension(&e, extent)?))?;
            }
            Event::Start(e) if local_name(e.name().as_ref()) == b"sheetData" => {
                saw_sheet_data = true;
                writer.write_event(Event::Start(e.into_owned()))?;
                patch_sheet_data(&mut reader, &mut writer, &mut queue)?;
            }
            Event::Empty(e) if local_name(e.name().as_ref()) == b"sheetData" => {
                saw_sheet_data = true;
                writer.write_event(Event::Start(e.into_owned()))?;
                write_rows_before(&mut writer, &mut queue, u32::MAX)?;
                writer.write_event(Event::End(BytesEnd::new("sheetData")))?;
            }
            Event::Eof => break,
            ev => writer.write_event(ev.into_owned())?,
        }
        buf.clear();
    }

    if !saw_sheet_data {
        return Err(TransferError::WorkbookIo(
            "worksheet has no sheetData element".to_string(),
        ));
    }
    Ok(writer.into_inner())
}

fn patch_sheet_data<R: BufRead>(
    reader: &mut Reader<R>,
    writer: &mut Writer<Vec<u8>>,
    queue: &mut RowQueue<'_>,
) -> TransferResult<()> {
    let mut buf = Vec::new();
    let mut last_row = 0;
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if local_name(e.name().as_ref()) == b"row" => {
                let row = row_number(&e, last_row)?;
                last_row = row;
                write_rows_before(writer, queue, row)?;
                match queue.pop_at(row) {
                    Some(cells) => {
                        writer.write_event(Event::Start(without_spans(&e)?))?;
                        patch_row(reader, writer, row, &cells)?;
                    }
                    None => writer.write_event(Event::Start(e.into_owned()))?,
                }
            }
            Event::Empty(e) if local_name(e.name().as_ref()) == b"row" => {
                let row = row_number(&e, last_row)?;
                last_row = row;
                write_rows_before(writer, queue, row)?;
                match queue.pop_at(row) {
                    Some(cells) => {
                        writer.write_event(Event::Start(without_spans(&e)?))?;
                        for (col, value) in &cells {
                            write_cell(writer, row, *col, value, None)?;
                        }
                        writer.write_event(Event::End(BytesEnd::new("row")))?;
                    }
                    None => writer.write_event(Event::Empty(e.into_owned()))?,
                }
            }
            Event::End(e) if local_name(e.name().as_ref()) == b"sheetData" => {
                write_rows_before(writer, queue, u32::MAX)?;
                writer.write_event(Event::End(e.into_owned()))?;
                return Ok(());
            }
            Event::Eof => return Err(truncated("sheetData")),
            ev => writer.write_event(ev.into_owned())?,
        }
        buf.clear();
    }
}

fn patch_row<R: BufRead>(
    reader: &mut Reader<R>,
    writer: &mut Writer<Vec<u8>>,
    row: u32,
    cells: &[(u32, &str)],
) -> TransferResult<()> {
    let mut buf = Vec::new();
    let mut next = 0;
    let mut last_col = 0;
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if local_name(e.name().as_ref()) == b"c" => {
                let (col, style) = cell_attrs(&e, last_col)?;
                last_col = col;
                next = write_cells_before(writer, row, cells, next, col)?;
                match cells.get(next) {
                    Some((c, value)) if *c == col => {
                        next += 1;
                        skip_element(reader)?;
                        write_cell(writer, row, col, value, style.as_deref())?;
                    }
                    _ => writer.write_event(Event::Start(e.into_owned()))?,
                }
            }
            Event::Empty(e) if local_name(e.name().as_ref()) == b"c" => {
                let (col, style) = cell_attrs(&e, last_col)?;
                last_col = col;
                next = write_cells_before(writer, row, cells, next, col)?;
                match cells.get(next) {
                    Some((c, value)) if *c == col => {
                        next += 1;
                        write_cell(writer, row, col, value, style.as_deref())?;
                    }
                    _ => writer.write_event(Event::Empty(e.into_owned()))?,
                }
            }
            Event::End(e) if local_name(e.name().as_ref()) == b"row" => {
                write_cells_before(writer, row, cells, next, u32::MAX)?;
                writer.write_event(Event::End(e.into_owned()))?;
                return Ok(());
            }
            Event::Eof => return Err(truncated("row")),
            ev => writer.write_event(ev.into_owned())?,
        }
        buf.clear();
    }
}

/// Consume the rest of the element whose start tag was just read
fn skip_element<R: BufRead>(reader: &mut Reader<R>) -> TransferResult<()> {
    let mut buf = Vec::new();
    let mut depth = 1usize;
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Event::Eof => return Err(truncated("c")),
            _ => {}
        }
        buf.clear();
    }
}

fn write_rows_before(
    writer: &mut Writer<Vec<u8>>,
    queue: &mut RowQueue<'_>,
    limit: u32,
) -> TransferResult<()> {
    while let Some((row, cells)) = queue.pop_before(limit) {
        let mut start = BytesStart::new("row");
        start.push_attribute(("r", row.to_string().as_str()));
        writer.write_event(Event::Start(start))?;
        for (col, value) in &cells {
            write_cell(writer, row, *col, value, None)?;
        }
        writer.write_event(Event::End(BytesEnd::new("row")))?;
    }
    Ok(())
}

/// Write queued cells left of `limit`; returns the new queue position
fn write_cells_before(
    writer: &mut Writer<Vec<u8>>,
    row: u32,
    cells: &[(u32, &str)],
    mut next: usize,
    limit: u32,
) -> TransferResult<usize> {
    while let Some((col, value)) = cells.get(next).filter(|(col, _)| *col < limit) {
        write_cell(writer, row, *col, value, None)?;
        next += 1;
    }
    Ok(next)
}

fn write_cell(
    writer: &mut Writer<Vec<u8>>,
    row: u32,
    col: u32,
    value: &str,
    style: Option<&str>,
) -> TransferResult<()> {
    let reference = cell_reference(row, col);
    let mut cell = BytesStart::new("c");
    cell.push_attribute(("r", reference.as_str()));
    if let Some(style) = style {
        cell.push_attribute(("s", style));
    }
    cell.push_attribute(("t", "inlineStr"));
    writer.write_event(Event::Start(cell))?;
    writer.write_event(Event::Start(BytesStart::new("is")))?;

    let mut text = BytesStart::new("t");
    if value.trim() != value {
        text.push_attribute(("xml:space", "preserve"));
    }
    writer.write_event(Event::Start(text))?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    writer.write_event(Event::End(BytesEnd::new("t")))?;

    writer.write_event(Event::End(BytesEnd::new("is")))?;
    writer.write_event(Event::End(BytesEnd::new("c")))?;
    Ok(())
}

/// Row number from `r`, or the one after `last_row` when omitted
fn row_number(row: &BytesStart<'_>, last_row: u32) -> TransferResult<u32> {
    for attr in row.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if local_name(attr.key.as_ref()) == b"r" {
            return attr_text(&attr.value)?
                .parse()
                .map_err(|_| TransferError::Parse("invalid row number in worksheet".to_string()));
        }
    }
    Ok(last_row + 1)
}

/// Column and style of a cell, the column implied by `last_col` when `r` is omitted
fn cell_attrs(cell: &BytesStart<'_>, last_col: u32) -> TransferResult<(u32, Option<String>)> {
    let mut col = None;
    let mut style = None;
    for attr in cell.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        match local_name(attr.key.as_ref()) {
            b"r" => {
                let reference = attr_text(&attr.value)?;
                let (_, c) = parse_reference(&reference).ok_or_else(|| {
                    TransferError::Parse(format!("invalid cell reference '{}'", reference))
                })?;
                col = Some(c);
            }
            b"s" => style = Some(attr_text(&attr.value)?),
            _ => {}
        }
    }
    Ok((col.unwrap_or(last_col + 1), style))
}

/// Copy of a row start tag without the `spans` hint, which edits can invalidate
fn without_spans(row: &BytesStart<'_>) -> TransferResult<BytesStart<'static>> {
    let name = String::from_utf8_lossy(row.name().as_ref()).into_owned();
    let mut out = BytesStart::new(name);
    for attr in row.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if local_name(attr.key.as_ref()) != b"spans" {
            out.push_attribute(attr);
        }
    }
    Ok(out)
}

/// Grow `<dimension ref>` so it still covers every cell
fn widen_dimension(
    dimension: &BytesStart<'_>,
    (max_row, max_col): (u32, u32),
) -> TransferResult<BytesStart<'static>> {
    let name = String::from_utf8_lossy(dimension.name().as_ref()).into_owned();
    let mut out = BytesStart::new(name);
    for attr in dimension.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if local_name(attr.key.as_ref()) != b"ref" {
            out.push_attribute(attr);
            continue;
        }
        let range = attr_text(&attr.value)?;
        let (start, end) = range
            .split_once(':')
            .unwrap_or((range.as_str(), range.as_str()));
        let widened = match (parse_reference(start), parse_reference(end)) {
            (Some(_), Some((end_row, end_col))) => format!(
                "{}:{}",
                start,
                cell_reference(end_row.max(max_row), end_col.max(max_col))
            ),
            _ => range.clone(),
        };
        out.push_attribute(("ref", widened.as_str()));
    }
    Ok(out)
}

/// A1-style reference for a 1-based row and column
pub(crate) fn cell_reference(row: u32, col: u32) -> String {
    let mut letters = Vec::new();
    let mut n = col;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    format!("{}{}", String::from_utf8_lossy(&letters), row)
}

/// 1-based (row, column) of an A1-style reference
pub(crate) fn parse_reference(reference: &str) -> Option<(u32, u32)> {
    let reference = reference.replace('$', "");
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() || !letters.bytes().all(|b| b.is_ascii_alphabetic()) {
        return None;
    }
    let col = letters.bytes().try_fold(0u32, |acc, b| {
        acc.checked_mul(26)?
            .checked_add(u32::from(b.to_ascii_uppercase() - b'A') + 1)
    })?;
    let row = digits.parse().ok().filter(|r| *r > 0)?;
    Some((row, col))
}

fn attr_text(value: &[u8]) -> TransferResult<String> {
    std::str::from_utf8(value)
        .map(str::to_string)
        .map_err(|e| TransferError::Parse(format!("worksheet attribute is not UTF-8: {}", e)))
}

fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().rposition(|b| *b == b':') {
        Some(idx) => &name[idx + 1..],
        None => name,
    }
}

fn truncated(element: &str) -> TransferError {
    TransferError::WorkbookIo(format!("worksheet XML ends inside <{}>", element))
}
