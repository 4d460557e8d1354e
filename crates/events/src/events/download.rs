use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::FailureContext;

/// Download-specific events for the event system
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DownloadEvent {
    /// Transfer started; `resume_offset` is non-zero when continuing a partial file
    Started {
        url: String,
        total_size: Option<u64>,
        resume_offset: u64,
    },

    /// Bytes on disk so far, including any resumed prefix
    Progress {
        url: String,
        bytes_downloaded: u64,
        total_bytes: Option<u64>,
    },

    /// Continuing from a partial file
    Resuming {
        url: String,
        resume_offset: u64,
        total_size: Option<u64>,
    },

    /// Server answered a range request with the full body
    RangeIgnored { url: String, status: u16 },

    /// Retrying after a transient failure
    Retrying {
        url: String,
        attempt: u32,
        max_attempts: u32,
        reason: String,
        backoff_delay: Duration,
    },

    /// Transfer finalized at `path`
    Completed {
        url: String,
        path: PathBuf,
        final_size: u64,
        total_time: Duration,
    },

    /// Digest of the finalized file did not match; the file stays on disk
    HashMismatch {
        url: String,
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// Transfer failed; a partial file may remain for resume
    Failed {
        url: String,
        bytes_downloaded: u64,
        failure: FailureContext,
    },
}
