//! Desktop launcher errors

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

/// Errors that can occur while creating a desktop shortcut
#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LauncherError {
    #[error("shortcut target not found: {path}")]
    TargetNotFound { path: String },

    #[error("desktop directory could not be determined")]
    DesktopNotFound,

    #[error("process execution failed: {command} - {message}")]
    ProcessExecutionFailed { command: String, message: String },

    #[error("failed to write shortcut {path}: {message}")]
    WriteFailed { path: String, message: String },

    #[error("shortcuts are not supported on {platform}")]
    UnsupportedPlatform { platform: String },
}

impl UserFacingError for LauncherError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::DesktopNotFound => Some("Set [launcher] desktop_dir in the configuration file."),
            Self::ProcessExecutionFailed { .. } => {
                Some("The extracted files are in place; create the shortcut manually.")
            }
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::TargetNotFound { .. } => "launcher.target_not_found",
            Self::DesktopNotFound => "launcher.desktop_not_found",
            Self::ProcessExecutionFailed { .. } => "launcher.process_failed",
            Self::WriteFailed { .. } => "launcher.write_failed",
            Self::UnsupportedPlatform { .. } => "launcher.unsupported_platform",
        };
        Some(code)
    }
}
