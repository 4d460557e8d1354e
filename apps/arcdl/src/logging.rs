//! Tracing setup and structured logging of events
//!
//! Every [`AppEvent`] that reaches the CLI is also written to the tracing
//! subscriber with structured fields, so `--debug` log files carry the full
//! event stream.

use arcdl_events::{AppEvent, DownloadEvent, ExtractEvent, GeneralEvent, LauncherEvent};
use std::path::Path;
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::EnvFilter;

const DEBUG_FILTER: &str = "info,arcdl=debug,arcdl_ops=debug,arcdl_net=debug,arcdl_extract=debug";
const DEFAULT_FILTER: &str = "warn";

/// Initialize tracing/logging
///
/// - JSON mode: nothing on stderr; with `--debug`, JSON lines to a log file
/// - debug mode: JSON lines to a timestamped file in `log_dir`
/// - otherwise: warnings and errors to stderr
pub fn init_tracing(json_mode: bool, debug_flag: bool, log_dir: &Path) {
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_flag;

    if debug_enabled {
        match create_log_file(log_dir) {
            Ok((file, path)) => {
                tracing_subscriber::fmt()
                    .json()
                    .with_writer(file)
                    .with_env_filter(filter_or(DEBUG_FILTER))
                    .init();
                if !json_mode {
                    eprintln!("Debug logging enabled: {}", path.display());
                }
                return;
            }
            Err(e) if !json_mode => {
                eprintln!("Warning: Failed to create log file: {e}");
            }
            Err(_) => {}
        }
    }

    if json_mode {
        // Keep stdout and stderr free for the JSON document
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter_or(if debug_enabled {
                DEBUG_FILTER
            } else {
                DEFAULT_FILTER
            }))
            .init();
    }
}

fn filter_or(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

fn create_log_file(log_dir: &Path) -> std::io::Result<(std::fs::File, std::path::PathBuf)> {
    std::fs::create_dir_all(log_dir)?;
    let path = log_dir.join(format!(
        "arcdl-{}.log",
        chrono::Utc::now().format("%Y%m%d-%H%M%S")
    ));
    let file = std::fs::File::create(&path)?;
    Ok((file, path))
}

/// Log an `AppEvent` using the tracing infrastructure with structured fields
pub fn log_event_with_tracing(event: &AppEvent) {
    match event {
        AppEvent::Download(download_event) => match download_event {
            DownloadEvent::Started {
                url,
                total_size,
                resume_offset,
            } => {
                info!(target: "arcdl::events::download", url = %url, total_size = ?total_size, resume_offset, "download started");
            }
            DownloadEvent::Progress {
                url,
                bytes_downloaded,
                total_bytes,
            } => {
                trace!(target: "arcdl::events::download", url = %url, bytes_downloaded, total_bytes = ?total_bytes, "download progress");
            }
            DownloadEvent::Resuming {
                url,
                resume_offset,
                total_size,
            } => {
                debug!(target: "arcdl::events::download", url = %url, resume_offset, total_size = ?total_size, "resuming download");
            }
            DownloadEvent::RangeIgnored { url, status } => {
                debug!(target: "arcdl::events::download", url = %url, status, "range request ignored");
            }
            DownloadEvent::Retrying {
                url,
                attempt,
                max_attempts,
                reason,
                backoff_delay,
            } => {
                warn!(
                    target: "arcdl::events::download",
                    url = %url,
                    attempt,
                    max_attempts,
                    reason = %reason,
                    backoff_ms = u64::try_from(backoff_delay.as_millis()).unwrap_or(u64::MAX),
                    "retrying download"
                );
            }
            DownloadEvent::Completed {
                url,
                path,
                final_size,
                total_time,
            } => {
                info!(
                    target: "arcdl::events::download",
                    url = %url,
                    path = %path.display(),
                    final_size,
                    total_ms = u64::try_from(total_time.as_millis()).unwrap_or(u64::MAX),
                    "download completed"
                );
            }
            DownloadEvent::HashMismatch {
                url,
                path,
                expected,
                actual,
            } => {
                warn!(target: "arcdl::events::download", url = %url, path = %path.display(), expected = %expected, actual = %actual, "checksum mismatch");
            }
            DownloadEvent::Failed {
                url,
                bytes_downloaded,
                failure,
            } => {
                error!(
                    target: "arcdl::events::download",
                    url = %url,
                    bytes_downloaded,
                    retryable = failure.retryable,
                    code = ?failure.code,
                    error = %failure.message,
                    hint = ?failure.hint,
                    "download failed"
                );
            }
        },

        AppEvent::Extract(extract_event) => match extract_event {
            ExtractEvent::Started {
                archive,
                destination,
            } => {
                info!(target: "arcdl::events::extract", archive = %archive.display(), destination = %destination.display(), "extraction started");
            }
            ExtractEvent::Validated { entries } => {
                debug!(target: "arcdl::events::extract", entries, "archive validated");
            }
            ExtractEvent::DestinationCleared { destination } => {
                info!(target: "arcdl::events::extract", destination = %destination.display(), "destination cleared");
            }
            ExtractEvent::Completed {
                destination,
                files,
                directories,
            } => {
                info!(target: "arcdl::events::extract", destination = %destination.display(), files, directories, "extraction completed");
            }
            ExtractEvent::Failed { archive, failure } => {
                error!(
                    target: "arcdl::events::extract",
                    archive = %archive.display(),
                    code = ?failure.code,
                    error = %failure.message,
                    "extraction failed"
                );
            }
        },

        AppEvent::Launcher(launcher_event) => match launcher_event {
            LauncherEvent::ShortcutCreated { target, shortcut } => {
                info!(target: "arcdl::events::launcher", executable = %target.display(), shortcut = %shortcut.display(), "shortcut created");
            }
            LauncherEvent::Failed { target, failure } => {
                warn!(
                    target: "arcdl::events::launcher",
                    executable = %target.display(),
                    code = ?failure.code,
                    error = %failure.message,
                    "shortcut creation failed"
                );
            }
            LauncherEvent::ExecutableNotFound { root, pattern } => {
                info!(target: "arcdl::events::launcher", root = %root.display(), pattern = %pattern, "executable not found");
            }
        },

        AppEvent::General(general_event) => match general_event {
            GeneralEvent::Warning { message, context } => {
                warn!(target: "arcdl::events::general", context = ?context, "{message}");
            }
            GeneralEvent::Error { message, details } => {
                error!(target: "arcdl::events::general", details = ?details, "{message}");
            }
            GeneralEvent::DebugLog { message } => {
                debug!(target: "arcdl::events::general", "{message}");
            }
            GeneralEvent::OperationStarted { operation } => {
                info!(target: "arcdl::events::general", operation = %operation, "operation started");
            }
            GeneralEvent::OperationCompleted { operation, success } => {
                info!(target: "arcdl::events::general", operation = %operation, success, "operation completed");
            }
            GeneralEvent::OperationFailed { operation, failure } => {
                error!(
                    target: "arcdl::events::general",
                    operation = %operation,
                    code = ?failure.code,
                    error = %failure.message,
                    retryable = failure.retryable,
                    "operation failed"
                );
            }
        },
    }
}
