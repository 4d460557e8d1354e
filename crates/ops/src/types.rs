//! Types for operations and results

use arcdl_extract::ExtractReport;
use arcdl_hash::{Hash, HashAlgorithm};
use arcdl_net::FetchResult;
use serde::Serialize;
use std::path::PathBuf;

/// Download a single file
#[derive(Clone, Debug)]
pub struct FetchRequest {
    pub url: String,
    /// Destination file; defaults to the URL's file name in the download dir
    pub dest: Option<PathBuf>,
    pub expected_hash: Option<Hash>,
    pub resume: bool,
}

impl FetchRequest {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            dest: None,
            expected_hash: None,
            resume: true,
        }
    }
}

/// Download, extract, and link an application archive
#[derive(Clone, Debug)]
pub struct InstallRequest {
    pub url: String,
    /// Extraction directory
    pub install_dir: PathBuf,
    /// Where the archive is downloaded to
    pub download_to: Option<PathBuf>,
    pub expected_hash: Option<Hash>,
    /// Falls back to `[extract] overwrite`
    pub overwrite: Option<bool>,
    /// Glob locating the executable in the extracted tree
    pub executable: Option<String>,
    pub shortcut: bool,
    pub shortcut_name: Option<String>,
    pub shortcut_args: Option<String>,
}

impl InstallRequest {
    #[must_use]
    pub fn new(url: impl Into<String>, install_dir: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            install_dir: install_dir.into(),
            download_to: None,
            expected_hash: None,
            overwrite: None,
            executable: None,
            shortcut: true,
            shortcut_name: None,
            shortcut_args: None,
        }
    }
}

/// What happened to the desktop shortcut
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ShortcutOutcome {
    Created { path: PathBuf },
    Skipped { reason: String },
    Failed { message: String },
}

/// Installation report
#[derive(Clone, Debug, Serialize)]
pub struct InstallReport {
    pub download: FetchResult,
    pub extract: ExtractReport,
    /// First file matching the executable pattern
    pub executable: Option<PathBuf>,
    pub shortcut: ShortcutOutcome,
    pub duration_ms: u64,
}

/// Digest of a local file
#[derive(Clone, Debug, Serialize)]
pub struct HashReport {
    pub path: PathBuf,
    pub algorithm: HashAlgorithm,
    pub hash: String,
}

/// Files matched under a directory
#[derive(Clone, Debug, Serialize)]
pub struct FindReport {
    pub root: PathBuf,
    pub pattern: String,
    pub matches: Vec<PathBuf>,
}
