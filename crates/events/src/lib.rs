#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for async communication in arcdl
//!
//! Library crates never print. They report what they are doing through
//! [`AppEvent`]s sent over an unbounded channel, and the CLI decides how to
//! render them (progress bars, status lines, JSON).
//!
//! ## Architecture
//!
//! - **Domain events**: grouped by functional domain (Download, Extract, Launcher)
//! - **Unified `EventEmitter` trait**: one API for all event emissions
//! - **Tracing integration**: every event knows its log level and target
//! - **Progress sinks**: byte-level progress goes through [`ProgressSink`] so the
//!   transfer loop does not depend on the channel

pub mod events;
pub use events::{
    AppEvent, DownloadEvent, ExtractEvent, FailureContext, GeneralEvent, LauncherEvent,
};

pub mod sink;
pub use sink::{EventProgress, NoProgress, ProgressSink};

use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Type alias for the event sender
pub type EventSender = UnboundedSender<AppEvent>;

/// Type alias for the event receiver
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<AppEvent>;

/// Create a new event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// The unified trait for emitting events throughout arcdl
///
/// Implemented for the raw [`EventSender`] and for any context struct that
/// carries one.
pub trait EventEmitter {
    /// Get the event sender for this emitter
    fn event_sender(&self) -> Option<&EventSender>;

    /// Emit an event through this emitter
    fn emit(&self, event: AppEvent) {
        if let Some(sender) = self.event_sender() {
            // Receiver gone means nobody is listening; keep going
            let _ = sender.send(event);
        }
    }

    /// Emit a debug log event
    fn emit_debug(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::debug(message)));
    }

    /// Emit a warning event
    fn emit_warning(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::warning(message)));
    }

    /// Emit a warning event with context
    fn emit_warning_with_context(&self, message: impl Into<String>, context: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::warning_with_context(
            message, context,
        )));
    }

    /// Emit an error event
    fn emit_error(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::error(message)));
    }

    /// Emit an operation started event
    fn emit_operation_started(&self, operation: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::OperationStarted {
            operation: operation.into(),
        }));
    }

    /// Emit an operation completed event
    fn emit_operation_completed(&self, operation: impl Into<String>, success: bool) {
        self.emit(AppEvent::General(GeneralEvent::OperationCompleted {
            operation: operation.into(),
            success,
        }));
    }

    /// Emit an operation failed event
    fn emit_operation_failed(&self, operation: impl Into<String>, failure: FailureContext) {
        self.emit(AppEvent::General(GeneralEvent::OperationFailed {
            operation: operation.into(),
            failure,
        }));
    }

    /// Emit a download started event
    fn emit_download_started(
        &self,
        url: impl Into<String>,
        total_size: Option<u64>,
        resume_offset: u64,
    ) {
        self.emit(AppEvent::Download(DownloadEvent::Started {
            url: url.into(),
            total_size,
            resume_offset,
        }));
    }

    /// Emit a download progress event
    fn emit_download_progress(&self, url: impl Into<String>, bytes: u64, total: Option<u64>) {
        self.emit(AppEvent::Download(DownloadEvent::Progress {
            url: url.into(),
            bytes_downloaded: bytes,
            total_bytes: total,
        }));
    }

    /// Emit a download retrying event
    fn emit_download_retrying(
        &self,
        url: impl Into<String>,
        attempt: u32,
        max_attempts: u32,
        reason: impl Into<String>,
        backoff_delay: Duration,
    ) {
        self.emit(AppEvent::Download(DownloadEvent::Retrying {
            url: url.into(),
            attempt,
            max_attempts,
            reason: reason.into(),
            backoff_delay,
        }));
    }

    /// Emit a download completed event
    fn emit_download_completed(
        &self,
        url: impl Into<String>,
        path: PathBuf,
        final_size: u64,
        total_time: Duration,
    ) {
        self.emit(AppEvent::Download(DownloadEvent::Completed {
            url: url.into(),
            path,
            final_size,
            total_time,
        }));
    }

    /// Emit an extraction started event
    fn emit_extract_started(&self, archive: PathBuf, destination: PathBuf) {
        self.emit(AppEvent::Extract(ExtractEvent::Started {
            archive,
            destination,
        }));
    }

    /// Emit an extraction completed event
    fn emit_extract_completed(&self, destination: PathBuf, files: usize, directories: usize) {
        self.emit(AppEvent::Extract(ExtractEvent::Completed {
            destination,
            files,
            directories,
        }));
    }
}

/// Implementation of `EventEmitter` for the raw `EventSender`
impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}
