use eyre::{Context, Report, Result};
use serde::Serialize;
use std::path::PathBuf;

use crate::collection::Placement;
use crate::publish::CommandFailed;

pub const DEFAULT_JSON_FILE: &str = "confirmed-partners.json";
pub const DEFAULT_STATUS: &str = "Подтверждено";
pub const DEFAULT_SOURCE: &str = "Telegram";
pub const DEFAULT_REMOTE: &str = "origin";

/// Configuration required to run the intake pipeline.
/// This decouples the logic from how the arguments were parsed (CLI/Config file).
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    pub json_file: PathBuf,
    pub status: String,
    pub source: String,
    pub remote: String,
    pub append: bool,
    pub publish: bool,
    pub placement: Placement,
    pub quiet: bool,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            json_file: PathBuf::from(DEFAULT_JSON_FILE),
            status: DEFAULT_STATUS.to_string(),
            source: DEFAULT_SOURCE.to_string(),
            remote: DEFAULT_REMOTE.to_string(),
            append: false,
            publish: false,
            placement: Placement::Append,
            quiet: false,
        }
    }
}

impl IntakeConfig {
    /// Publishing needs the record to be in the file first.
    pub fn should_merge(&self) -> bool {
        self.append || self.publish
    }
}

/// Pretty JSON with 2-space indentation, non-ASCII left as is.
pub fn format_json_pretty<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).wrap_err("Failed to serialize JSON")
}

/// The single diagnostic line printed before exiting with a failure. External
/// command failures are shown exactly as the command reported them.
pub fn error_line(err: &Report) -> String {
    match err.downcast_ref::<CommandFailed>() {
        Some(failed) => failed.to_string(),
        None => format!("Error: {err:#}"),
    }
}
