#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Safe ZIP extraction for arcdl
//!
//! Every member is validated against the destination before a single byte is
//! written: names that climb out with `..`, absolute paths, drive prefixes
//! and symlink members abort the whole extraction. On Windows, reserved
//! device names are refused as well.

pub mod archive;
pub mod find;
pub mod security;

pub use archive::{ArchiveEntry, EntryKind};
pub use find::{find_files, find_first};
pub use security::{resolve_entry, resolve_path};

use arcdl_errors::{Error, StorageError};
use arcdl_events::{AppEvent, EventEmitter, EventSender, ExtractEvent, FailureContext};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What to extract and where
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    pub archive: PathBuf,
    pub dest: PathBuf,
    /// Remove `dest` before extracting
    pub overwrite: bool,
}

impl ExtractRequest {
    #[must_use]
    pub fn new(archive: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> Self {
        Self {
            archive: archive.into(),
            dest: dest.into(),
            overwrite: false,
        }
    }

    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// Result of a successful extraction
#[derive(Debug, Clone, Serialize)]
pub struct ExtractReport {
    pub destination: PathBuf,
    pub files: usize,
    pub directories: usize,
    pub bytes: u64,
}

/// Extracts archives, reporting progress as [`ExtractEvent`]s
///
/// Symlink members are refused rather than written, so archives carrying
/// them (macOS application bundles, for one) fail with
/// `ArchiveError::UnsafeEntry` before anything is extracted. Stored unix
/// permissions are restored with the owner write bit kept, so extracting the
/// same archive again over its own output works.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    tx: Option<EventSender>,
}

impl EventEmitter for Extractor {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl Extractor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_events(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Extract synchronously
    ///
    /// # Errors
    ///
    /// - `StorageError::PathNotFound` if the archive is missing
    /// - `ArchiveError::InvalidFormat` if it is not a readable ZIP
    /// - `ArchiveError::PathTraversal` / `ArchiveError::UnsafeEntry` if any
    ///   member is unsafe, in which case nothing is written
    /// - storage errors from writing the tree
    pub fn extract_blocking(&self, request: &ExtractRequest) -> Result<ExtractReport, Error> {
        self.emit_extract_started(request.archive.clone(), request.dest.clone());
        let result = self.run(request);
        match &result {
            Ok(report) => {
                self.emit_extract_completed(
                    report.destination.clone(),
                    report.files,
                    report.directories,
                );
            }
            Err(e) => self.emit(AppEvent::Extract(ExtractEvent::Failed {
                archive: request.archive.clone(),
                failure: FailureContext::from_error(e),
            })),
        }
        result
    }

    /// Extract on a blocking task
    ///
    /// # Errors
    ///
    /// See [`Extractor::extract_blocking`].
    pub async fn extract(&self, request: ExtractRequest) -> Result<ExtractReport, Error> {
        let extractor = self.clone();
        tokio::task::spawn_blocking(move || extractor.extract_blocking(&request))
            .await
            .map_err(|e| Error::internal(format!("extraction task failed: {e}")))?
    }

    fn run(&self, request: &ExtractRequest) -> Result<ExtractReport, Error> {
        let ExtractRequest {
            archive,
            dest,
            overwrite,
        } = request;

        let mut zip = archive::open(archive)?;

        // Nothing touches the disk until every member has been validated
        let resolved = resolve_path(dest)?;
        let planned = archive::plan(&mut zip, archive, &resolved)?;
        debug!(archive = %archive.display(), entries = planned.len(), "archive validated");
        self.emit(AppEvent::Extract(ExtractEvent::Validated {
            entries: planned.len(),
        }));

        if *overwrite && clear_destination(dest, &resolved)? {
            self.emit(AppEvent::Extract(ExtractEvent::DestinationCleared {
                destination: dest.clone(),
            }));
        }
        std::fs::create_dir_all(dest).map_err(|e| StorageError::from_io_with_path(&e, dest))?;

        // The directory now exists and may resolve differently
        let resolved = resolve_path(dest)?;
        let planned = archive::plan(&mut zip, archive, &resolved)?;

        let written = archive::materialize(&mut zip, archive, &planned)?;
        debug!(
            dest = %dest.display(),
            files = written.files,
            directories = written.directories,
            "archive extracted"
        );

        Ok(ExtractReport {
            destination: dest.clone(),
            files: written.files,
            directories: written.directories,
            bytes: written.bytes,
        })
    }
}

/// Returns whether anything was removed
fn clear_destination(dest: &Path, resolved: &Path) -> Result<bool, Error> {
    if resolved.parent().is_none() {
        return Err(StorageError::InvalidPath {
            path: dest.display().to_string(),
        }
        .into());
    }
    match std::fs::symlink_metadata(dest) {
        Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(dest),
        Ok(_) => std::fs::remove_file(dest),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => Err(e),
    }
    .map_err(|e| StorageError::from_io_with_path(&e, dest))?;
    debug!(dest = %dest.display(), "destination cleared");
    Ok(true)
}

/// Extract synchronously without events
///
/// # Errors
///
/// See [`Extractor::extract_blocking`].
pub fn extract_archive(request: &ExtractRequest) -> Result<ExtractReport, Error> {
    Extractor::new().extract_blocking(request)
}

/// Extract `archive` into `dest` on a blocking task
///
/// # Errors
///
/// See [`Extractor::extract_blocking`].
pub async fn extract(archive: &Path, dest: &Path, overwrite: bool) -> Result<ExtractReport, Error> {
    Extractor::new()
        .extract(ExtractRequest::new(archive, dest).with_overwrite(overwrite))
        .await
}
