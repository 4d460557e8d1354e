//! ZIP planning and materialization

use crate::security::resolve_entry;
use arcdl_errors::{ArchiveError, Error, StorageError};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Kind of archive member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One validated archive member and where it will land
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub index: usize,
    pub name: String,
    pub target: PathBuf,
    pub kind: EntryKind,
    pub unix_mode: Option<u32>,
    pub size: u64,
}

pub(crate) fn invalid_format(archive: &Path, err: &zip::result::ZipError) -> Error {
    ArchiveError::InvalidFormat {
        path: archive.to_path_buf(),
        message: err.to_string(),
    }
    .into()
}

/// Open `archive` and read its central directory
///
/// # Errors
///
/// `StorageError::PathNotFound` if the file is missing,
/// `ArchiveError::InvalidFormat` if it is not a readable ZIP.
pub fn open(archive: &Path) -> Result<ZipArchive<File>, Error> {
    let file = File::open(archive).map_err(|e| StorageError::from_io_with_path(&e, archive))?;
    ZipArchive::new(file).map_err(|e| invalid_format(archive, &e))
}

/// Validate every member against `dest` without writing anything
///
/// `dest` must already be resolved (see [`crate::security::resolve_path`]).
///
/// # Errors
///
/// Fails on the first member that is unreadable, a symlink, or would land
/// outside `dest`.
pub fn plan(
    zip: &mut ZipArchive<File>,
    archive: &Path,
    dest: &Path,
) -> Result<Vec<ArchiveEntry>, Error> {
    let mut entries = Vec::with_capacity(zip.len());
    for index in 0..zip.len() {
        let file = zip
            .by_index_raw(index)
            .map_err(|e| invalid_format(archive, &e))?;
        let name = file.name().to_string();

        if file.is_symlink() {
            return Err(ArchiveError::UnsafeEntry {
                entry: name,
                reason: "symbolic links are not extracted".to_string(),
            }
            .into());
        }

        let target = resolve_entry(dest, &name)?;
        let kind = if file.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        entries.push(ArchiveEntry {
            index,
            target,
            kind,
            unix_mode: file.unix_mode(),
            size: file.size(),
            name,
        });
    }
    Ok(entries)
}

// Re-extraction must be able to replace files and add to directories
const OWNER_WRITE: u32 = 0o200;
const OWNER_ALL: u32 = 0o700;

/// Totals from a materialization pass
#[derive(Debug, Default, Clone, Copy)]
pub struct Written {
    pub files: usize,
    pub directories: usize,
    pub bytes: u64,
}

/// Write planned members to disk
///
/// Stored unix modes are applied with the owner keeping write access, and
/// directory modes only after every file is written.
///
/// # Errors
///
/// Returns an error if a member cannot be decompressed or written.
pub fn materialize(
    zip: &mut ZipArchive<File>,
    archive: &Path,
    entries: &[ArchiveEntry],
) -> Result<Written, Error> {
    let mut written = Written::default();
    let mut dir_modes = Vec::new();

    for entry in entries {
        match entry.kind {
            EntryKind::Directory => {
                fs::create_dir_all(&entry.target)
                    .map_err(|e| StorageError::from_io_with_path(&e, &entry.target))?;
                written.directories += 1;
                if let Some(mode) = entry.unix_mode {
                    dir_modes.push((entry.target.clone(), mode | OWNER_ALL));
                }
            }
            EntryKind::File => {
                if let Some(parent) = entry.target.parent() {
                    fs::create_dir_all(parent)
                        .map_err(|e| StorageError::from_io_with_path(&e, parent))?;
                }
                let mut source = zip
                    .by_index(entry.index)
                    .map_err(|e| invalid_format(archive, &e))?;
                let mut out = File::create(&entry.target)
                    .map_err(|e| StorageError::from_io_with_path(&e, &entry.target))?;
                written.bytes += io::copy(&mut source, &mut out).map_err(|e| {
                    if e.kind() == io::ErrorKind::InvalidData {
                        invalid_format(archive, &zip::result::ZipError::Io(e))
                    } else {
                        StorageError::from_io_with_path(&e, &entry.target).into()
                    }
                })?;
                written.files += 1;
                if let Some(mode) = entry.unix_mode {
                    set_mode(&entry.target, mode | OWNER_WRITE)?;
                }
            }
        }
    }

    // Deepest first
    dir_modes.sort_by(|a, b| b.0.components().count().cmp(&a.0.components().count()));
    for (path, mode) in dir_modes {
        set_mode(&path, mode)?;
    }

    Ok(written)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<(), Error> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o777))
        .map_err(|e| StorageError::from_io_with_path(&e, path).into())
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn set_mode(_path: &Path, _mode: u32) -> Result<(), Error> {
    Ok(())
}
