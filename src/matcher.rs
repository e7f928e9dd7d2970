//! Row matching between the source and target sheets
//!
//! Two passes over the source rows:
//!
//! 1. Every row whose Product ID occurs more than once is marked
//!    `Duplicated = YES` (all occurrences, including the first).
//! 2. Each unsettled row with both a Product ID and a Rack ID copies its
//!    Rack ID into the first target row with the same Product ID, provided
//!    that target's Rack ID is still blank, and is marked `Copied = YES`.
//!
//! Nothing here touches a workbook; the result is a list of cell updates
//! per side plus counters for every row that was left alone.

use crate::error::{TransferError, TransferResult};
use crate::types::{CellUpdate, CellValue, Dataset, SOURCE_COLUMNS, TARGET_COLUMNS, YES};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Source rows that produced no copy, by reason
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkipCounts {
    /// Already marked Duplicated or Copied (including this run's duplicates)
    pub settled: usize,
    /// Product ID or Rack ID blank
    pub blank: usize,
    /// No target row with the same Product ID
    pub unmatched: usize,
    /// Matching target row already has a Rack ID
    pub target_populated: usize,
}

impl SkipCounts {
    pub fn total(&self) -> usize {
        self.settled + self.blank + self.unmatched + self.target_populated
    }
}

/// Updates for both workbooks produced by one matching pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchOutcome {
    pub source_updates: Vec<CellUpdate>,
    pub target_updates: Vec<CellUpdate>,
    /// Source rows newly marked Duplicated
    pub duplicated: usize,
    /// Source rows whose Rack ID was copied
    pub copied: usize,
    pub skipped: SkipCounts,
}

impl MatchOutcome {
    pub fn is_empty(&self) -> bool {
        self.source_updates.is_empty() && self.target_updates.is_empty()
    }
}

/// Hashable form of a Product ID
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum MatchKey {
    Number(u64),
    Text(String),
    Bool(bool),
}

impl MatchKey {
    /// `None` for blank cells and error values
    fn of(value: &CellValue) -> Option<Self> {
        match value {
            _ if value.is_blank() => None,
            CellValue::Text(s) => Some(MatchKey::Text(s.clone())),
            // 0.0 and -0.0 compare equal as numbers
            CellValue::Number(n) if *n == 0.0 => Some(MatchKey::Number(0f64.to_bits())),
            CellValue::Number(n) => Some(MatchKey::Number(n.to_bits())),
            CellValue::Bool(b) => Some(MatchKey::Bool(*b)),
            CellValue::Empty | CellValue::Error(_) => None,
        }
    }
}

fn parse_error(ds: &Dataset, row: usize, column: usize, value: &str) -> TransferError {
    TransferError::Parse(format!(
        "sheet '{}' row {} column {} ('{}') holds error value {}",
        ds.sheet_name,
        ds.physical_row(row),
        ds.physical_column(column),
        ds.columns[column],
        value
    ))
}

/// Compute the cell updates for one run
pub fn match_datasets(source: &Dataset, target: &Dataset) -> TransferResult<MatchOutcome> {
    let src = source.require_columns("Source", &SOURCE_COLUMNS)?;
    let (s_pid, s_rack, s_dup, s_copied) = (src[0], src[1], src[2], src[3]);
    let tgt = target.require_columns("Target", &TARGET_COLUMNS)?;
    let (t_pid, t_rack) = (tgt[0], tgt[1]);

    let mut outcome = MatchOutcome::default();
    let mut duplicated: Vec<bool> = (0..source.len())
        .map(|r| source.cell(r, s_dup).is_yes())
        .collect();
    let copied: Vec<bool> = (0..source.len())
        .map(|r| source.cell(r, s_copied).is_yes())
        .collect();

    // Pass 1: duplicates
    let mut occurrences: HashMap<MatchKey, usize> = HashMap::new();
    let keys: Vec<Option<MatchKey>> = (0..source.len())
        .map(|r| MatchKey::of(source.cell(r, s_pid)))
        .collect();
    for key in keys.iter().flatten() {
        *occurrences.entry(key.clone()).or_default() += 1;
    }
    for (row, key) in keys.iter().enumerate() {
        // Blank Product IDs have no key, so they never form a duplicate group
        let Some(key) = key else { continue };
        if occurrences[key] < 2 || duplicated[row] {
            continue;
        }
        debug!(row = source.physical_row(row), "duplicate Product ID");
        duplicated[row] = true;
        outcome.duplicated += 1;
        outcome.source_updates.push(CellUpdate::new(
            source.physical_row(row),
            source.physical_column(s_dup),
            YES,
        ));
    }

    // First target row per Product ID
    let mut target_index: HashMap<MatchKey, usize> = HashMap::new();
    for row in 0..target.len() {
        if let Some(key) = MatchKey::of(target.cell(row, t_pid)) {
            target_index.entry(key).or_insert(row);
        }
    }
    let mut target_filled: Vec<bool> = (0..target.len())
        .map(|r| !target.cell(r, t_rack).is_blank())
        .collect();

    // Pass 2: copy Rack IDs
    for row in 0..source.len() {
        if duplicated[row] || copied[row] {
            outcome.skipped.settled += 1;
            continue;
        }

        let pid = source.cell(row, s_pid);
        let rack = source.cell(row, s_rack);
        if pid.is_blank() || rack.is_blank() {
            outcome.skipped.blank += 1;
            continue;
        }
        if let CellValue::Error(e) = pid {
            return Err(parse_error(source, row, s_pid, e));
        }
        if let CellValue::Error(e) = rack {
            return Err(parse_error(source, row, s_rack, e));
        }

        let Some(&target_row) = keys[row].as_ref().and_then(|k| target_index.get(k)) else {
            debug!(row = source.physical_row(row), "no target row for Product ID");
            outcome.skipped.unmatched += 1;
            continue;
        };
        if target_filled[target_row] {
            debug!(
                row = source.physical_row(row),
                target_row = target.physical_row(target_row),
                "target Rack ID already populated"
            );
            outcome.skipped.target_populated += 1;
            continue;
        }

        target_filled[target_row] = true;
        outcome.copied += 1;
        outcome.target_updates.push(CellUpdate::new(
            target.physical_row(target_row),
            target.physical_column(t_rack),
            rack.to_text(),
        ));
        outcome.source_updates.push(CellUpdate::new(
            source.physical_row(row),
            source.physical_column(s_copied),
            YES,
        ));
    }

    Ok(outcome)
}
