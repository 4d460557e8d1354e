//! Locating files inside an extracted tree

use arcdl_errors::{ConfigError, Error};
use globset::{Glob, GlobBuilder, GlobMatcher};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

fn matcher(pattern: &str) -> Result<GlobMatcher, Error> {
    let glob: Result<Glob, _> = GlobBuilder::new(pattern)
        .case_insensitive(cfg!(windows))
        .literal_separator(true)
        .build();
    glob.map(|g| g.compile_matcher()).map_err(|e| {
        ConfigError::InvalidValue {
            field: "pattern".to_string(),
            value: format!("{pattern}: {e}"),
        }
        .into()
    })
}

/// Find every regular file under `root` matching `pattern`
///
/// A pattern without `/` is matched against the file name alone, so
/// `app.exe` finds `bin/app.exe`. A pattern with `/` is matched against the
/// path relative to `root`. Results are sorted.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` for a malformed glob.
pub fn find_files(root: &Path, pattern: &str) -> Result<Vec<PathBuf>, Error> {
    let matcher = matcher(pattern)?;
    let by_name = !pattern.contains('/');

    let mut found: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            if by_name {
                matcher.is_match(entry.file_name())
            } else {
                entry
                    .path()
                    .strip_prefix(root)
                    .is_ok_and(|rel| matcher.is_match(rel))
            }
        })
        .map(walkdir::DirEntry::into_path)
        .collect();
    found.sort();
    Ok(found)
}

/// First match of [`find_files`], if any
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` for a malformed glob.
pub fn find_first(root: &Path, pattern: &str) -> Result<Option<PathBuf>, Error> {
    Ok(find_files(root, pattern)?.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn tree() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("bin")).unwrap();
        fs::create_dir_all(dir.path().join("tools/bin")).unwrap();
        fs::write(dir.path().join("bin/app.exe"), b"x").unwrap();
        fs::write(dir.path().join("tools/bin/helper.exe"), b"x").unwrap();
        fs::write(dir.path().join("readme.txt"), b"x").unwrap();
        dir
    }

    #[test]
    fn test_name_pattern_searches_recursively() {
        let dir = tree();
        let found = find_files(dir.path(), "*.exe").unwrap();
        assert_eq!(
            found,
            vec![
                dir.path().join("bin/app.exe"),
                dir.path().join("tools/bin/helper.exe")
            ]
        );
        assert_eq!(
            find_first(dir.path(), "app.exe").unwrap(),
            Some(dir.path().join("bin/app.exe"))
        );
    }

    #[test]
    fn test_relative_path_pattern() {
        let dir = tree();
        let found = find_files(dir.path(), "bin/*.exe").unwrap();
        assert_eq!(found, vec![dir.path().join("bin/app.exe")]);
        let found = find_files(dir.path(), "**/bin/*.exe").unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_no_match_and_bad_pattern() {
        let dir = tree();
        assert_eq!(find_first(dir.path(), "missing.exe").unwrap(), None);
        let err = find_files(dir.path(), "[").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::InvalidValue { .. })));
    }
}
