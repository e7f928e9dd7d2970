//! The begin action: read both sheets, match, write back

use crate::error::TransferResult;
use crate::excel::{apply_updates, read_dataset};
use crate::matcher::{match_datasets, MatchOutcome};
use crate::settings::Settings;
use crate::types::Selection;
use serde::Serialize;
use tracing::info;

/// What one run did (or, for a dry run, would do)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferReport {
    pub source: Selection,
    pub target: Selection,
    pub dry_run: bool,
    #[serde(flatten)]
    pub outcome: MatchOutcome,
}

impl TransferReport {
    /// One-line summary for the completion message
    pub fn summary(&self) -> String {
        format!(
            "Copied {} Rack ID(s), marked {} duplicate row(s), skipped {} row(s)",
            self.outcome.copied,
            self.outcome.duplicated,
            self.outcome.skipped.total()
        )
    }
}

/// Run the transfer for the saved selections
///
/// Source updates are written before target updates. Any error aborts
/// the run; a failed target write leaves the source already updated.
pub fn run(settings: &Settings, dry_run: bool) -> TransferResult<TransferReport> {
    let (source, target) = settings.require()?;

    let source_data = read_dataset(&source.file_path, &source.sheet_name)?;
    let target_data = read_dataset(&target.file_path, &target.sheet_name)?;
    info!(
        source_rows = source_data.len(),
        target_rows = target_data.len(),
        "workbooks loaded"
    );

    let outcome = match_datasets(&source_data, &target_data)?;
    info!(
        source_updates = outcome.source_updates.len(),
        target_updates = outcome.target_updates.len(),
        skipped = outcome.skipped.total(),
        "matching complete"
    );

    if !dry_run {
        apply_updates(&source.file_path, &source.sheet_name, &outcome.source_updates)?;
        apply_updates(&target.file_path, &target.sheet_name, &outcome.target_updates)?;
    }

    Ok(TransferReport {
        source: source.clone(),
        target: target.clone(),
        dry_run,
        outcome,
    })
}
