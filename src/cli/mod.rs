//! CLI command handlers

pub mod commands;

pub use commands::{begin, select, status, template};
