use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::FailureContext;

/// Desktop shortcut events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LauncherEvent {
    ShortcutCreated { target: PathBuf, shortcut: PathBuf },

    /// Shortcut creation failed; the install itself still succeeded
    Failed {
        target: PathBuf,
        failure: FailureContext,
    },

    /// No file under the extracted tree matched the executable pattern
    ExecutableNotFound { root: PathBuf, pattern: String },
}
