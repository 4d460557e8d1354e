use serde::{Deserialize, Serialize};

use arcdl_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureContext {
    /// Stable error code, when the error carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    /// Optional remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether retrying the operation might succeed.
    pub retryable: bool,
}

impl FailureContext {
    /// Construct a new failure context.
    #[must_use]
    pub fn new(
        code: Option<impl Into<String>>,
        message: impl Into<String>,
        hint: Option<impl Into<String>>,
        retryable: bool,
    ) -> Self {
        Self {
            code: code.map(Into::into),
            message: message.into(),
            hint: hint.map(Into::into),
            retryable,
        }
    }

    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self::new(
            error.user_code(),
            error.user_message().into_owned(),
            error.user_hint(),
            error.is_retryable(),
        )
    }
}

pub mod download;
pub mod extract;
pub mod general;
pub mod launcher;

pub use download::*;
pub use extract::*;
pub use general::*;
pub use launcher::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// General utility events (warnings, errors, operations)
    General(GeneralEvent),

    /// Transfer lifecycle and byte progress
    Download(DownloadEvent),

    /// Archive validation and materialization
    Extract(ExtractEvent),

    /// Desktop shortcut creation
    Launcher(LauncherEvent),
}

impl AppEvent {
    /// Determine the appropriate tracing log level for this event
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;

        match self {
            Self::General(GeneralEvent::Error { .. } | GeneralEvent::OperationFailed { .. })
            | Self::Download(DownloadEvent::Failed { .. })
            | Self::Extract(ExtractEvent::Failed { .. }) => Level::ERROR,

            Self::General(GeneralEvent::Warning { .. })
            | Self::Download(DownloadEvent::HashMismatch { .. } | DownloadEvent::Retrying { .. })
            | Self::Launcher(LauncherEvent::Failed { .. }) => Level::WARN,

            Self::General(GeneralEvent::DebugLog { .. })
            | Self::Download(DownloadEvent::Resuming { .. } | DownloadEvent::RangeIgnored { .. }) => {
                Level::DEBUG
            }

            Self::Download(DownloadEvent::Progress { .. }) => Level::TRACE,

            _ => Level::INFO,
        }
    }

    /// Get the log target for this event (for structured logging)
    #[must_use]
    pub fn log_target(&self) -> &'static str {
        match self {
            Self::General(_) => "arcdl::events::general",
            Self::Download(_) => "arcdl::events::download",
            Self::Extract(_) => "arcdl::events::extract",
            Self::Launcher(_) => "arcdl::events::launcher",
        }
    }
}
