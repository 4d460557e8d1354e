//! Path security validation
//!
//! Every archive member is resolved to the exact path it would be written to
//! and checked against the resolved destination before anything touches the
//! disk. Resolution is lexical for `.` and `..`, and goes through the
//! filesystem for ancestors that already exist, so a symlink planted inside
//! the destination cannot redirect a write outside of it.

use arcdl_errors::{ArchiveError, Error, StorageError};
use std::path::{Component, Path, PathBuf};

/// Resolve `path` as far as the filesystem allows
///
/// The longest existing ancestor is canonicalized (following symlinks); the
/// remaining components are appended lexically.
///
/// # Errors
///
/// Returns an error if an existing ancestor cannot be canonicalized.
pub fn resolve_path(path: &Path) -> Result<PathBuf, Error> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| Error::io_with_path(&e, path))?
            .join(path)
    };
    let normalized = normalize_lexically(&absolute);

    let mut existing = normalized.as_path();
    let mut rest = Vec::new();
    loop {
        match existing.symlink_metadata() {
            Ok(_) => break,
            Err(_) => match (existing.parent(), existing.file_name()) {
                (Some(parent), Some(name)) => {
                    rest.push(name.to_os_string());
                    existing = parent;
                }
                _ => break,
            },
        }
    }

    // A dangling symlink fails here too
    let mut resolved = existing
        .canonicalize()
        .map_err(|e| StorageError::from_io_with_path(&e, existing))?;
    for name in rest.into_iter().rev() {
        resolved.push(name);
    }
    Ok(resolved)
}

/// Drop `.` and fold `..` without touching the filesystem
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolve archive member `name` under the resolved destination `dest`
///
/// Backslashes are treated as separators. The result is the path the member
/// would be written to.
///
/// # Errors
///
/// - `ArchiveError::PathTraversal` for absolute names and names that climb out
///   of `dest`, lexically or through an existing symlink
/// - `ArchiveError::UnsafeEntry` for drive prefixes, empty names and control
///   characters; on Windows also for `:` and reserved device names
pub fn resolve_entry(dest: &Path, name: &str) -> Result<PathBuf, Error> {
    let traversal = || -> Error {
        ArchiveError::PathTraversal {
            entry: name.to_string(),
            dest: dest.to_path_buf(),
        }
        .into()
    };

    let normalized = name.replace('\\', "/");
    if normalized.trim_matches('/').is_empty() {
        return Err(unsafe_entry(name, "empty path"));
    }
    if normalized.starts_with('/') {
        return Err(traversal());
    }
    if has_drive_prefix(&normalized) {
        return Err(unsafe_entry(name, "drive prefix"));
    }

    let mut target = dest.to_path_buf();
    for part in normalized.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if !target.pop() || !target.starts_with(dest) {
                    return Err(traversal());
                }
            }
            component => {
                validate_component(name, component)?;
                target.push(component);
            }
        }
    }

    if !target.starts_with(dest) {
        return Err(traversal());
    }

    // Follow whatever already exists on disk
    let resolved = resolve_path(&target)?;
    if !resolved.starts_with(dest) {
        return Err(traversal());
    }
    Ok(resolved)
}

fn has_drive_prefix(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn unsafe_entry(name: &str, reason: &str) -> Error {
    ArchiveError::UnsafeEntry {
        entry: name.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

/// Validates an individual path component
fn validate_component(name: &str, component: &str) -> Result<(), Error> {
    if component.chars().any(char::is_control) {
        return Err(unsafe_entry(name, "control character in path"));
    }
    #[cfg(windows)]
    validate_windows_component(name, component)?;

    if component.len() > 255 {
        return Err(unsafe_entry(name, "path component too long"));
    }
    Ok(())
}

/// Names Windows cannot create or would route to a device
#[cfg(windows)]
fn validate_windows_component(name: &str, component: &str) -> Result<(), Error> {
    const DEVICES: [&str; 22] = [
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    if component.contains(':') {
        return Err(unsafe_entry(name, "':' in path component"));
    }

    let stem = component
        .split('.')
        .next()
        .unwrap_or(component)
        .to_ascii_uppercase();
    if DEVICES.contains(&stem.as_str()) {
        return Err(unsafe_entry(name, "reserved device name"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn dest() -> (tempfile::TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let resolved = dir.path().canonicalize().unwrap();
        (dir, resolved)
    }

    #[test]
    fn test_plain_entries_resolve_inside() {
        let (_dir, dest) = dest();
        assert_eq!(
            resolve_entry(&dest, "bin/app.exe").unwrap(),
            dest.join("bin").join("app.exe")
        );
        assert_eq!(
            resolve_entry(&dest, "./data/./config.json").unwrap(),
            dest.join("data").join("config.json")
        );
        // Climbing back down inside the destination is fine
        assert_eq!(
            resolve_entry(&dest, "a/../b.txt").unwrap(),
            dest.join("b.txt")
        );
        assert_eq!(resolve_entry(&dest, "dir/").unwrap(), dest.join("dir"));
    }

    #[test]
    fn test_traversal_is_rejected() {
        let (_dir, dest) = dest();
        for name in ["../evil.txt", "a/../../evil.txt", "/etc/passwd", "..\\evil.txt", "a\\..\\..\\x"] {
            let err = resolve_entry(&dest, name).unwrap_err();
            assert!(
                matches!(err, Error::Archive(ArchiveError::PathTraversal { .. })),
                "{name}: {err:?}"
            );
        }
    }

    #[test]
    fn test_unsafe_names_are_rejected() {
        let (_dir, dest) = dest();
        for name in ["C:/Windows/evil.dll", "c:evil", "", "/", "a/nul\0.txt"] {
            let err = resolve_entry(&dest, name).unwrap_err();
            assert!(err.is_security_violation(), "{name}: {err:?}");
        }
    }

    #[cfg(not(windows))]
    #[test]
    fn test_device_like_names_resolve_inside() {
        let (_dir, dest) = dest();
        for name in ["src/aux.c", "docs/con.txt", "nul.json", "logs/com1.log", "logs/12:00.txt"] {
            let resolved = resolve_entry(&dest, name).unwrap();
            assert!(resolved.starts_with(&dest), "{name}");
        }
    }

    #[cfg(windows)]
    #[test]
    fn test_device_names_rejected_on_windows() {
        let (_dir, dest) = dest();
        for name in ["aux.txt", "x/CON", "logs/12:00.txt"] {
            let err = resolve_entry(&dest, name).unwrap_err();
            assert!(err.is_security_violation(), "{name}: {err:?}");
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_existing_symlink_cannot_escape() {
        let (_dir, dest) = dest();
        let outside = tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path(), dest.join("link")).unwrap();

        let err = resolve_entry(&dest, "link/evil.txt").unwrap_err();
        assert!(matches!(
            err,
            Error::Archive(ArchiveError::PathTraversal { .. })
        ));
    }

    #[test]
    fn test_resolve_missing_path() {
        let (_dir, dest) = dest();
        let p = resolve_path(&dest.join("not").join("yet").join("..").join("here")).unwrap();
        assert_eq!(p, dest.join("not").join("here"));
    }
}
