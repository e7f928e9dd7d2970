//! Persisted source/target selections
//!
//! One YAML record holds both sides:
//!
//! ```yaml
//! source:
//!   file_path: /data/stock.xlsx
//!   sheet_name: Inventory
//! target:
//!   file_path: /data/orders.xlsx
//!   sheet_name: Sheet1
//! ```
//!
//! Either side may be absent. Unknown keys, empty values and values with
//! line breaks are rejected as malformed.
//!
//! When the YAML record does not exist yet, the two legacy plain-text
//! records (`source_file.txt`, `target_file.txt`; path on line one, sheet
//! on line two) are read from the same directory instead.

use crate::error::{TransferError, TransferResult};
use crate::types::{Selection, Side};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default settings file name, relative to the working directory
pub const SETTINGS_FILE: &str = "rack_transfer.yaml";

const LEGACY_SOURCE_FILE: &str = "source_file.txt";
const LEGACY_TARGET_FILE: &str = "target_file.txt";

/// Both selections; begin is only possible when both are present
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Selection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Selection>,
}

impl Settings {
    pub fn get(&self, side: Side) -> Option<&Selection> {
        match side {
            Side::Source => self.source.as_ref(),
            Side::Target => self.target.as_ref(),
        }
    }

    pub fn set(&mut self, side: Side, selection: Selection) {
        match side {
            Side::Source => self.source = Some(selection),
            Side::Target => self.target = Some(selection),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.source.is_some() && self.target.is_some()
    }

    /// Both selections, or the side that is missing
    pub fn require(&self) -> TransferResult<(&Selection, &Selection)> {
        let source = self
            .source
            .as_ref()
            .ok_or(TransferError::MissingSelection("source"))?;
        let target = self
            .target
            .as_ref()
            .ok_or(TransferError::MissingSelection("target"))?;
        Ok((source, target))
    }
}

/// File-backed settings record
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current selections
    pub fn load(&self) -> TransferResult<Settings> {
        if !self.path.exists() {
            return self.load_legacy();
        }

        let content = fs::read_to_string(&self.path)?;
        let settings = if content.trim().is_empty() {
            Settings::default()
        } else {
            serde_yaml::from_str::<Settings>(&content)
                .map_err(|e| TransferError::malformed(&self.path, e.to_string()))?
        };
        for selection in [&settings.source, &settings.target].into_iter().flatten() {
            validate_selection(&self.path, selection)?;
        }

        debug!(
            path = %self.path.display(),
            source = settings.source.is_some(),
            target = settings.target.is_some(),
            "loaded settings"
        );
        Ok(settings)
    }

    /// Record `selection` for `side`, then reload
    ///
    /// A malformed existing record is replaced rather than blocking
    /// the new selection.
    pub fn save(&self, side: Side, selection: Selection) -> TransferResult<Settings> {
        validate_selection(&self.path, &selection)?;

        let mut settings = match self.load() {
            Ok(settings) => settings,
            Err(e @ TransferError::MalformedSettings { .. }) => {
                warn!("replacing unreadable settings: {}", e);
                Settings::default()
            }
            Err(e) => return Err(e),
        };
        settings.set(side, selection);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_yaml::to_string(&settings)?)?;
        info!(path = %self.path.display(), side = %side, "saved selection");

        self.load()
    }

    fn legacy_path(&self, side: Side) -> PathBuf {
        let name = match side {
            Side::Source => LEGACY_SOURCE_FILE,
            Side::Target => LEGACY_TARGET_FILE,
        };
        match self.path.parent() {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }

    fn load_legacy(&self) -> TransferResult<Settings> {
        let mut settings = Settings::default();
        for side in [Side::Source, Side::Target] {
            let path = self.legacy_path(side);
            if !path.exists() {
                continue;
            }
            let content = fs::read_to_string(&path)?;
            let selection = parse_legacy_record(&path, &content)?;
            debug!(path = %path.display(), side = %side, "read legacy settings record");
            settings.set(side, selection);
        }
        Ok(settings)
    }
}

/// Two lines: file path, then sheet name
fn parse_legacy_record(path: &Path, content: &str) -> TransferResult<Selection> {
    let lines: Vec<&str> = content.lines().collect();
    if lines.len() != 2 {
        return Err(TransferError::malformed(
            path,
            format!("expected 2 lines (path, sheet), found {}", lines.len()),
        ));
    }
    let selection = Selection::new(lines[0].trim(), lines[1].trim());
    validate_selection(path, &selection)?;
    Ok(selection)
}

fn validate_selection(path: &Path, selection: &Selection) -> TransferResult<()> {
    let file = selection.file_path.to_string_lossy();
    if file.trim().is_empty() {
        return Err(TransferError::malformed(path, "file path is empty"));
    }
    if selection.sheet_name.trim().is_empty() {
        return Err(TransferError::malformed(path, "sheet name is empty"));
    }
    if file.contains(['\n', '\r']) || selection.sheet_name.contains(['\n', '\r']) {
        return Err(TransferError::malformed(
            path,
            "file path and sheet name must not contain line breaks",
        ));
    }
    Ok(())
}
