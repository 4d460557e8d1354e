//! Byte-level progress reporting

use crate::{AppEvent, DownloadEvent, EventSender};

/// Receives transfer progress
///
/// Called once per chunk written. `bytes` is the number of bytes on disk so
/// far (including any resumed prefix); `total` is the full resource size when
/// the server reported one.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, bytes: u64, total: Option<u64>);
}

/// Sink that discards all progress
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&self, _bytes: u64, _total: Option<u64>) {}
}

/// Sink that forwards progress as [`DownloadEvent::Progress`] events
#[derive(Debug, Clone)]
pub struct EventProgress {
    url: String,
    tx: EventSender,
}

impl EventProgress {
    #[must_use]
    pub fn new(url: impl Into<String>, tx: EventSender) -> Self {
        Self {
            url: url.into(),
            tx,
        }
    }
}

impl ProgressSink for EventProgress {
    fn on_progress(&self, bytes: u64, total: Option<u64>) {
        let _ = self.tx.send(AppEvent::Download(DownloadEvent::Progress {
            url: self.url.clone(),
            bytes_downloaded: bytes,
            total_bytes: total,
        }));
    }
}
