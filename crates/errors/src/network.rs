//! Network-related error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NetworkError {
    #[error("connection timeout to {url}")]
    Timeout { url: String },

    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("unsupported protocol: {protocol}")]
    UnsupportedProtocol { protocol: String },

    #[error("HTTP error {status}: {message}")]
    HttpError { status: u16, message: String },

    #[error("checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },
}

impl NetworkError {
    /// Transport-level failures that a fresh attempt may clear
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::DownloadFailed(_) | Self::ConnectionRefused(_)
        )
    }
}

impl UserFacingError for NetworkError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Timeout { .. } | Self::ConnectionRefused(_) => {
                Some("Check that the server is reachable, then run the command again.")
            }
            Self::DownloadFailed(_) => {
                Some("The partial download was kept; run the command again to resume.")
            }
            Self::ChecksumMismatch { .. } => Some(
                "The downloaded file was kept for inspection; delete it or verify the expected hash.",
            ),
            Self::InvalidUrl(_) | Self::UnsupportedProtocol { .. } => {
                Some("Use an http:// or https:// URL.")
            }
            Self::HttpError { status, .. } if *status == 404 => {
                Some("The server does not have this file; check the URL.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Self::HttpError { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            other => other.is_transient(),
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::Timeout { .. } => "network.timeout",
            Self::DownloadFailed(_) => "network.download_failed",
            Self::ConnectionRefused(_) => "network.connection_refused",
            Self::InvalidUrl(_) => "network.invalid_url",
            Self::UnsupportedProtocol { .. } => "network.unsupported_protocol",
            Self::HttpError { .. } => "network.http_status",
            Self::ChecksumMismatch { .. } => "network.checksum_mismatch",
        };
        Some(code)
    }
}
