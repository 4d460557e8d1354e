#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Desktop shortcut creation for arcdl
//!
//! A [`Launcher`] places a shortcut to an installed executable on the user's
//! desktop. Each platform gets a thin implementation; the orchestration layer
//! picks one with [`platform_launcher`] and treats failures as warnings.

mod freedesktop;
mod macos;
mod windows;

pub use freedesktop::DesktopEntryLauncher;
pub use macos::CommandScriptLauncher;
pub use windows::PowerShellLauncher;

use arcdl_errors::{Error, LauncherError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What the shortcut should point at
#[derive(Debug, Clone, Default)]
pub struct ShortcutSpec {
    /// Executable the shortcut launches
    pub target: PathBuf,
    /// Shortcut name without extension; defaults to the target's file stem
    pub name: Option<String>,
    /// Argument string passed to the target
    pub args: Option<String>,
    /// Defaults to the target's parent directory
    pub working_dir: Option<PathBuf>,
    /// Defaults to the target itself
    pub icon: Option<PathBuf>,
    /// Overrides the detected desktop directory
    pub desktop_dir: Option<PathBuf>,
}

impl ShortcutSpec {
    #[must_use]
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_args(mut self, args: impl Into<String>) -> Self {
        self.args = Some(args.into());
        self
    }

    #[must_use]
    pub fn with_desktop_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.desktop_dir = Some(dir.into());
        self
    }

    /// Resolve defaults and absolute paths, creating the desktop directory
    ///
    /// # Errors
    ///
    /// `LauncherError::TargetNotFound` if the target does not exist,
    /// `LauncherError::DesktopNotFound` if no desktop directory is known.
    pub async fn resolve(&self, extension: &str) -> Result<ResolvedShortcut, Error> {
        let target = tokio::fs::canonicalize(&self.target).await.map_err(|_| {
            LauncherError::TargetNotFound {
                path: self.target.display().to_string(),
            }
        })?;

        let desktop = match &self.desktop_dir {
            Some(dir) => dir.clone(),
            None => desktop_dir().ok_or(LauncherError::DesktopNotFound)?,
        };
        tokio::fs::create_dir_all(&desktop)
            .await
            .map_err(|e| LauncherError::WriteFailed {
                path: desktop.display().to_string(),
                message: e.to_string(),
            })?;

        let name = match &self.name {
            Some(name) => name.clone(),
            None => target
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "shortcut".to_string()),
        };

        let working_dir = match &self.working_dir {
            Some(dir) => absolute(dir).await,
            None => target
                .parent()
                .map_or_else(|| target.clone(), Path::to_path_buf),
        };
        let icon = match &self.icon {
            Some(icon) => absolute(icon).await,
            None => target.clone(),
        };

        Ok(ResolvedShortcut {
            link: desktop.join(format!("{name}.{extension}")),
            name,
            target,
            args: self.args.clone().unwrap_or_default(),
            working_dir,
            icon,
        })
    }
}

async fn absolute(path: &Path) -> PathBuf {
    tokio::fs::canonicalize(path)
        .await
        .unwrap_or_else(|_| path.to_path_buf())
}

/// A shortcut with every default filled in
#[derive(Debug, Clone)]
pub struct ResolvedShortcut {
    /// Path of the shortcut file that will be written
    pub link: PathBuf,
    pub name: String,
    pub target: PathBuf,
    pub args: String,
    pub working_dir: PathBuf,
    pub icon: PathBuf,
}

/// Creates desktop shortcuts
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Create the shortcut and return its path
    async fn create_shortcut(&self, spec: &ShortcutSpec) -> Result<PathBuf, Error>;
}

/// Launcher for platforms without shortcut support
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedLauncher;

#[async_trait]
impl Launcher for UnsupportedLauncher {
    async fn create_shortcut(&self, _spec: &ShortcutSpec) -> Result<PathBuf, Error> {
        Err(LauncherError::UnsupportedPlatform {
            platform: std::env::consts::OS.to_string(),
        }
        .into())
    }
}

/// The launcher for the current platform
#[must_use]
pub fn platform_launcher() -> Arc<dyn Launcher> {
    if cfg!(windows) {
        Arc::new(PowerShellLauncher::new())
    } else if cfg!(target_os = "macos") {
        Arc::new(CommandScriptLauncher)
    } else if cfg!(unix) {
        Arc::new(DesktopEntryLauncher)
    } else {
        Arc::new(UnsupportedLauncher)
    }
}

/// The user's desktop directory, falling back to `~/Desktop`
#[must_use]
pub fn desktop_dir() -> Option<PathBuf> {
    dirs::desktop_dir().or_else(|| dirs::home_dir().map(|home| home.join("Desktop")))
}

#[cfg(unix)]
async fn make_executable(path: &Path) -> Result<(), Error> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .await
        .map_err(|e| write_failed(path, &e))
}

#[cfg(not(unix))]
#[allow(clippy::unused_async)]
async fn make_executable(_path: &Path) -> Result<(), Error> {
    Ok(())
}

fn write_failed(path: &Path, err: &std::io::Error) -> Error {
    LauncherError::WriteFailed {
        path: path.display().to_string(),
        message: err.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_resolve_fills_defaults() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("bin").join("app.exe");
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::write(&target, b"x").unwrap();
        let desktop = tmp.path().join("Desktop");

        let resolved = ShortcutSpec::new(&target)
            .with_desktop_dir(&desktop)
            .resolve("lnk")
            .await
            .unwrap();

        let target = target.canonicalize().unwrap();
        assert_eq!(resolved.name, "app");
        assert_eq!(resolved.link, desktop.join("app.lnk"));
        assert_eq!(resolved.working_dir, target.parent().unwrap());
        assert_eq!(resolved.icon, target);
        assert_eq!(resolved.target, target);
        assert_eq!(resolved.args, "");
        assert!(desktop.is_dir());
    }

    #[tokio::test]
    async fn test_missing_target() {
        let tmp = TempDir::new().unwrap();
        let err = ShortcutSpec::new(tmp.path().join("missing.exe"))
            .with_desktop_dir(tmp.path())
            .resolve("lnk")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Launcher(LauncherError::TargetNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_unsupported_launcher() {
        let err = UnsupportedLauncher
            .create_shortcut(&ShortcutSpec::new("x"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Launcher(LauncherError::UnsupportedPlatform { .. })
        ));
    }
}
