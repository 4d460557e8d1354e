//! Archive extraction error types

use std::borrow::Cow;
use std::path::PathBuf;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum ArchiveError {
    #[error("invalid archive {}: {message}", path.display())]
    InvalidFormat { path: PathBuf, message: String },

    #[error("illegal path in archive: {entry} resolves outside {}", dest.display())]
    PathTraversal { entry: String, dest: PathBuf },

    #[error("unsafe archive entry {entry}: {reason}")]
    UnsafeEntry { entry: String, reason: String },
}

impl ArchiveError {
    /// Whether the archive was rejected for trying to write outside the destination
    #[must_use]
    pub fn is_security_violation(&self) -> bool {
        matches!(self, Self::PathTraversal { .. } | Self::UnsafeEntry { .. })
    }
}

impl UserFacingError for ArchiveError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidFormat { .. } => {
                Some("The archive is damaged or not a ZIP file; download it again.")
            }
            Self::PathTraversal { .. } | Self::UnsafeEntry { .. } => {
                Some("Nothing was extracted. Do not trust this archive.")
            }
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::InvalidFormat { .. } => "archive.invalid_format",
            Self::PathTraversal { .. } => "archive.path_traversal",
            Self::UnsafeEntry { .. } => "archive.unsafe_entry",
        };
        Some(code)
    }
}
