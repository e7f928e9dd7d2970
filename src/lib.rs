//! Rack Transfer - copy Rack IDs between Excel workbooks
//!
//! A source sheet (`Product ID`, `Rack ID`, `Duplicated`, `Copied`) feeds a
//! target sheet (`Product ID`, `Rack ID`). Each run:
//!
//! - marks every source row with a repeated Product ID as `Duplicated = YES`
//! - copies the Rack ID of each remaining source row into the first target
//!   row with the same Product ID whose Rack ID is still blank
//! - marks those source rows `Copied = YES`, so the next run skips them
//!
//! Only the affected cells are rewritten; styles and other sheets survive.
//!
//! # Example
//!
//! ```no_run
//! use rack_transfer::settings::SettingsStore;
//! use rack_transfer::transfer;
//!
//! let store = SettingsStore::new("rack_transfer.yaml");
//! let settings = store.load()?;
//! let report = transfer::run(&settings, true)?;
//!
//! println!("{}", report.summary());
//! # Ok::<(), rack_transfer::error::TransferError>(())
//! ```

pub mod app;
pub mod cli;
#[cfg(feature = "dialog")]
pub mod dialog;
pub mod error;
pub mod excel;
pub mod matcher;
pub mod picker;
pub mod settings;
pub mod transfer;
pub mod types;

// Re-export commonly used types
pub use error::{TransferError, TransferResult};
pub use matcher::{match_datasets, MatchOutcome, SkipCounts};
pub use types::{CellUpdate, CellValue, Dataset, Selection, Side};
