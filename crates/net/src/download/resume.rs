//! Partial-file bookkeeping for resumable downloads

use arcdl_errors::{Error, StorageError};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs as tokio_fs;

/// In-progress path for `dest`: `<file name>.part` next to it
///
/// # Errors
///
/// Returns `StorageError::InvalidPath` if `dest` has no file name.
pub fn partial_path(dest: &Path) -> Result<PathBuf, Error> {
    with_suffix(dest, ".part")
}

/// Fresh sibling used when a transfer has to restart from byte 0 while a
/// partial file exists
pub(super) fn restart_path(dest: &Path) -> Result<PathBuf, Error> {
    with_suffix(dest, ".part.restart")
}

fn with_suffix(dest: &Path, suffix: &str) -> Result<PathBuf, Error> {
    let name = dest.file_name().ok_or_else(|| StorageError::InvalidPath {
        path: dest.display().to_string(),
    })?;
    let mut name = OsString::from(name);
    name.push(suffix);
    Ok(dest.with_file_name(name))
}

/// Get the offset for resuming a download
///
/// The on-disk length of the partial file is authoritative.
///
/// # Errors
///
/// Returns an error if the partial file exists but cannot be inspected.
pub(super) async fn get_resume_offset(partial: &Path) -> Result<u64, Error> {
    match tokio_fs::metadata(partial).await {
        Ok(metadata) if metadata.is_file() => Ok(metadata.len()),
        Ok(_) => Err(StorageError::InvalidPath {
            path: partial.display().to_string(),
        }
        .into()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(StorageError::from_io_with_path(&e, partial).into()),
    }
}

/// Move `from` onto `to`, replacing any existing file
///
/// Falls back to delete-then-rename when a plain rename fails (for example
/// when the platform refuses to replace an existing file).
pub(super) async fn finalize(from: &Path, to: &Path) -> Result<(), Error> {
    match tokio_fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(first) => {
            tracing::debug!(
                from = %from.display(),
                to = %to.display(),
                error = %first,
                "rename failed, removing destination and retrying"
            );
            match tokio_fs::remove_file(to).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(StorageError::from_io_with_path(&e, to).into()),
            }
            tokio_fs::rename(from, to).await.map_err(|e| {
                StorageError::AtomicRenameFailed {
                    message: format!("{} -> {}: {e}", from.display(), to.display()),
                }
                .into()
            })
        }
    }
}

/// Remove a file, ignoring a missing one
pub(super) async fn remove_if_exists(path: &Path) -> Result<(), Error> {
    match tokio_fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::from_io_with_path(&e, path).into()),
    }
}
