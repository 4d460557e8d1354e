//! macOS `.command` scripts, opened by Terminal on double-click

use crate::{make_executable, write_failed, Launcher, ResolvedShortcut, ShortcutSpec};
use arcdl_errors::Error;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Default, Clone, Copy)]
pub struct CommandScriptLauncher;

fn sh_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Render the launcher script
#[must_use]
pub fn render_script(shortcut: &ResolvedShortcut) -> String {
    let mut exec = format!("exec {}", sh_quote(&shortcut.target.to_string_lossy()));
    let args = shortcut.args.trim();
    if !args.is_empty() {
        exec.push(' ');
        exec.push_str(args);
    }
    format!(
        "#!/bin/sh\ncd {} || exit 1\n{exec}\n",
        sh_quote(&shortcut.working_dir.to_string_lossy()),
    )
}

#[async_trait]
impl Launcher for CommandScriptLauncher {
    async fn create_shortcut(&self, spec: &ShortcutSpec) -> Result<PathBuf, Error> {
        let shortcut = spec.resolve("command").await?;
        debug!(link = %shortcut.link.display(), "writing command script");

        tokio::fs::write(&shortcut.link, render_script(&shortcut))
            .await
            .map_err(|e| write_failed(&shortcut.link, &e))?;
        make_executable(&shortcut.link).await?;
        Ok(shortcut.link)
    }
}
