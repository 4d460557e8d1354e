#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! High-level operations orchestration for arcdl
//!
//! This crate serves as the orchestration layer between the CLI and the
//! specialized crates: it wires the fetcher, extractor and launcher together
//! and reports progress through the event channel.

mod context;
mod install;
mod small_ops;
mod types;

pub use context::{OpsContextBuilder, OpsCtx};
pub use install::install;
pub use small_ops::{default_destination, extract, fetch, find, hash};
pub use types::{
    FetchRequest, FindReport, HashReport, InstallReport, InstallRequest, ShortcutOutcome,
};

use arcdl_errors::Error;
use arcdl_extract::ExtractReport;
use arcdl_net::FetchResult;

/// Operation result that can be serialized for CLI output
#[derive(Clone, Debug, serde::Serialize)]
#[serde(tag = "type", content = "data")]
pub enum OperationResult {
    Fetch(FetchResult),
    Extract(ExtractReport),
    Install(InstallReport),
    Hash(HashReport),
    Find(FindReport),
    /// Generic success message
    Success(String),
}

impl OperationResult {
    /// Convert to JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Whether the command should exit successfully
    #[must_use]
    pub fn is_success(&self) -> bool {
        match self {
            OperationResult::Find(report) => !report.matches.is_empty(),
            _ => true,
        }
    }
}
