//! freedesktop.org `.desktop` entries

use crate::{make_executable, write_failed, Launcher, ResolvedShortcut, ShortcutSpec};
use arcdl_errors::Error;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

/// Linux and BSD launcher writing a desktop entry file
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopEntryLauncher;

/// Quote one `Exec` argument
///
/// Reserved characters are backslash-escaped inside double quotes, then the
/// value-level backslash escaping of the file format is applied on top.
fn exec_quote(arg: &str) -> String {
    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    for c in arg.chars() {
        if matches!(c, '"' | '`' | '$' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted.replace('\\', "\\\\").replace('%', "%%")
}

/// Escape a plain string value
fn value_escape(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('\t', "\\t")
        .replace('\r', "\\r")
}

/// Render the desktop entry
#[must_use]
pub fn render_entry(shortcut: &ResolvedShortcut) -> String {
    let mut exec = exec_quote(&shortcut.target.to_string_lossy());
    let args = shortcut.args.trim();
    if !args.is_empty() {
        exec.push(' ');
        exec.push_str(&value_escape(args).replace('%', "%%"));
    }

    format!(
        "[Desktop Entry]\n\
         Type=Application\n\
         Version=1.0\n\
         Name={}\n\
         Exec={}\n\
         Path={}\n\
         Icon={}\n\
         Terminal=false\n",
        value_escape(&shortcut.name),
        exec,
        value_escape(&shortcut.working_dir.to_string_lossy()),
        value_escape(&shortcut.icon.to_string_lossy()),
    )
}

#[async_trait]
impl Launcher for DesktopEntryLauncher {
    async fn create_shortcut(&self, spec: &ShortcutSpec) -> Result<PathBuf, Error> {
        let shortcut = spec.resolve("desktop").await?;
        debug!(link = %shortcut.link.display(), "writing desktop entry");

        tokio::fs::write(&shortcut.link, render_entry(&shortcut))
            .await
            .map_err(|e| write_failed(&shortcut.link, &e))?;
        // Desktop environments only trust executable entries
        make_executable(&shortcut.link).await?;
        Ok(shortcut.link)
    }
}
