//! `.lnk` shortcuts through PowerShell and `WScript.Shell`

use crate::{Launcher, ResolvedShortcut, ShortcutSpec};
use arcdl_errors::{Error, LauncherError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

/// Windows launcher driving the `WScript.Shell` COM object
#[derive(Debug, Clone)]
pub struct PowerShellLauncher {
    program: String,
}

impl PowerShellLauncher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            program: "powershell".to_string(),
        }
    }

    /// Use a different PowerShell executable, e.g. `pwsh`
    #[must_use]
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for PowerShellLauncher {
    fn default() -> Self {
        Self::new()
    }
}

/// Quote for a single-quoted PowerShell string literal
fn ps_quote(value: &str) -> String {
    value.replace('\'', "''")
}

/// Strip the `\\?\` prefix `canonicalize` adds on Windows
fn plain_path(path: &Path) -> String {
    let s = path.display().to_string();
    if let Some(rest) = s.strip_prefix(r"\\?\UNC\") {
        format!(r"\\{rest}")
    } else if let Some(rest) = s.strip_prefix(r"\\?\") {
        rest.to_string()
    } else {
        s
    }
}

/// Render the PowerShell script that writes the shortcut
#[must_use]
pub fn render_script(shortcut: &ResolvedShortcut) -> String {
    format!(
        "$s=(New-Object -ComObject WScript.Shell).CreateShortcut('{}');\
         $s.TargetPath='{}';\
         $s.Arguments='{}';\
         $s.WorkingDirectory='{}';\
         $s.IconLocation='{}';\
         $s.Save();",
        ps_quote(&plain_path(&shortcut.link)),
        ps_quote(&plain_path(&shortcut.target)),
        ps_quote(&shortcut.args),
        ps_quote(&plain_path(&shortcut.working_dir)),
        ps_quote(&plain_path(&shortcut.icon)),
    )
}

#[async_trait]
impl Launcher for PowerShellLauncher {
    async fn create_shortcut(&self, spec: &ShortcutSpec) -> Result<PathBuf, Error> {
        let shortcut = spec.resolve("lnk").await?;
        let script = render_script(&shortcut);
        debug!(link = %shortcut.link.display(), "creating shortcut via {}", self.program);

        let output = Command::new(&self.program)
            .args(["-NoProfile", "-NonInteractive", "-Command", &script])
            .output()
            .await
            .map_err(|e| LauncherError::ProcessExecutionFailed {
                command: self.program.clone(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(LauncherError::ProcessExecutionFailed {
                command: self.program.clone(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        Ok(shortcut.link)
    }
}
