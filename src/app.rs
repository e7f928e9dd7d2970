//! Application state and its rendered view
//!
//! The shell never keeps selections in widgets: it loads an [`AppState`],
//! renders it with [`render`], and re-renders after every action.

use crate::error::TransferResult;
use crate::settings::{Settings, SettingsStore};
use crate::transfer::TransferReport;
use crate::types::Side;
use serde::Serialize;
use std::fmt;

/// Result of the most recent begin action
#[derive(Debug, Clone)]
pub enum RunStatus {
    Succeeded(TransferReport),
    Failed(String),
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub settings: Settings,
    /// Set when the settings record could not be read
    pub settings_error: Option<String>,
    pub last_run: Option<RunStatus>,
}

impl AppState {
    /// Load the selections; a broken record leaves both sides unselected
    pub fn load(store: &SettingsStore) -> Self {
        Self::from_loaded(&store.load())
    }

    pub fn from_loaded(loaded: &TransferResult<Settings>) -> Self {
        match loaded {
            Ok(settings) => Self {
                settings: settings.clone(),
                ..Self::default()
            },
            Err(e) => {
                tracing::warn!("settings unavailable: {}", e);
                Self {
                    settings_error: Some(e.to_string()),
                    ..Self::default()
                }
            }
        }
    }

    pub fn begin_enabled(&self) -> bool {
        self.settings_error.is_none() && self.settings.is_ready()
    }
}

/// Everything the shell displays
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct View {
    pub source_label: String,
    pub target_label: String,
    pub begin_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

fn label(settings: &Settings, side: Side) -> String {
    match settings.get(side) {
        Some(selection) => selection.label(),
        None => format!("No {} File Selected", side.title()),
    }
}

pub fn render(state: &AppState) -> View {
    let message = match (&state.settings_error, &state.last_run) {
        (Some(e), _) => Some(e.clone()),
        (None, Some(RunStatus::Succeeded(report))) => Some(report.summary()),
        (None, Some(RunStatus::Failed(e))) => Some(e.clone()),
        (None, None) => None,
    };
    View {
        source_label: label(&state.settings, Side::Source),
        target_label: label(&state.settings, Side::Target),
        begin_enabled: state.begin_enabled(),
        message,
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Source: {}", self.source_label)?;
        writeln!(f, "Target: {}", self.target_label)?;
        write!(
            f,
            "Begin:  {}",
            if self.begin_enabled {
                "ready"
            } else {
                "disabled"
            }
        )?;
        if let Some(message) = &self.message {
            write!(f, "\n{}", message)?;
        }
        Ok(())
    }
}
