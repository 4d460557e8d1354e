//! Event handling and progress display

use crate::display::format_size;
use crate::logging::log_event_with_tracing;
use arcdl_events::{
    AppEvent, DownloadEvent, ExtractEvent, FailureContext, GeneralEvent, LauncherEvent,
};
use console::Style;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::collections::HashMap;
use std::path::Path;

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} {msg}";
const SPINNER_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] {bytes} {msg}";

/// Event handler for progress display and user feedback
pub struct EventHandler {
    /// Multi-progress manager for concurrent progress bars
    multi_progress: MultiProgress,
    /// Active progress bars by URL
    download_bars: HashMap<String, ProgressBar>,
    colors_enabled: bool,
    debug_enabled: bool,
}

impl EventHandler {
    /// Create new event handler
    ///
    /// A `quiet` handler still logs every event but draws nothing, so JSON
    /// output stays clean.
    pub fn new(colors_enabled: bool, debug_enabled: bool, quiet: bool) -> Self {
        let multi_progress = if quiet {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        } else {
            MultiProgress::new()
        };
        Self {
            multi_progress,
            download_bars: HashMap::new(),
            colors_enabled,
            debug_enabled,
        }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, event: AppEvent) {
        log_event_with_tracing(&event);

        match event {
            AppEvent::Download(event) => self.handle_download_event(event),
            AppEvent::Extract(event) => self.handle_extract_event(&event),
            AppEvent::Launcher(event) => self.handle_launcher_event(&event),
            AppEvent::General(event) => self.handle_general_event(&event),
        }
    }

    fn handle_download_event(&mut self, event: DownloadEvent) {
        match event {
            DownloadEvent::Started {
                url,
                total_size,
                resume_offset,
            } => self.handle_download_started(&url, total_size, resume_offset),
            DownloadEvent::Progress {
                url,
                bytes_downloaded,
                total_bytes,
            } => self.handle_download_progress(&url, bytes_downloaded, total_bytes),
            DownloadEvent::Resuming {
                url, resume_offset, ..
            } => {
                self.show_status(&format!(
                    "Resuming {} from {}",
                    file_name(&url),
                    format_size(resume_offset)
                ));
            }
            DownloadEvent::RangeIgnored { url, status } => {
                self.show_warning(&format!(
                    "Server ignored the range request for {} (HTTP {status}); restarting",
                    file_name(&url)
                ));
            }
            DownloadEvent::Retrying {
                url,
                attempt,
                max_attempts,
                reason,
                backoff_delay,
            } => {
                if let Some(pb) = self.download_bars.get(&url) {
                    pb.set_message(format!("retry {attempt}/{max_attempts}"));
                }
                self.show_warning(&format!(
                    "Retrying {} in {:.1}s (attempt {attempt}/{max_attempts}): {reason}",
                    file_name(&url),
                    backoff_delay.as_secs_f64()
                ));
            }
            DownloadEvent::Completed {
                url,
                path,
                final_size,
                total_time,
            } => {
                self.handle_download_completed(&url);
                self.show_success(&format!(
                    "Downloaded {} ({}) in {:.1}s",
                    path.display(),
                    format_size(final_size),
                    total_time.as_secs_f64()
                ));
            }
            DownloadEvent::HashMismatch {
                path,
                expected,
                actual,
                ..
            } => {
                self.show_error(&format!(
                    "Checksum mismatch for {}\n  expected {expected}\n  actual   {actual}",
                    path.display()
                ));
            }
            DownloadEvent::Failed { url, failure, .. } => {
                self.handle_download_failed(&url, &failure);
            }
        }
    }

    fn handle_extract_event(&self, event: &ExtractEvent) {
        match event {
            ExtractEvent::Started {
                archive,
                destination,
            } => {
                self.show_status(&format!(
                    "Extracting {} to {}",
                    archive.display(),
                    destination.display()
                ));
            }
            ExtractEvent::Validated { entries } => {
                self.show_debug(&format!("{entries} entries validated"));
            }
            ExtractEvent::DestinationCleared { destination } => {
                self.show_status(&format!("Removed existing {}", destination.display()));
            }
            ExtractEvent::Completed {
                destination,
                files,
                directories,
            } => {
                self.show_success(&format!(
                    "Extracted {files} files and {directories} directories to {}",
                    destination.display()
                ));
            }
            ExtractEvent::Failed { archive, failure } => {
                self.show_error(&format!(
                    "Extraction of {} failed: {}",
                    archive.display(),
                    failure.message
                ));
            }
        }
    }

    fn handle_launcher_event(&self, event: &LauncherEvent) {
        match event {
            LauncherEvent::ShortcutCreated { shortcut, .. } => {
                self.show_success(&format!("Shortcut created: {}", shortcut.display()));
            }
            LauncherEvent::Failed { target, failure } => {
                let mut message = format!(
                    "Could not create a shortcut for {}: {}",
                    target.display(),
                    failure.message
                );
                if let Some(hint) = &failure.hint {
                    message.push_str(&format!("\n  Hint: {hint}"));
                }
                self.show_warning(&message);
            }
            LauncherEvent::ExecutableNotFound { root, pattern } => {
                self.show_warning(&format!(
                    "No file matching {pattern:?} under {}; skipping shortcut",
                    root.display()
                ));
            }
        }
    }

    fn handle_general_event(&self, event: &GeneralEvent) {
        match event {
            GeneralEvent::Warning { message, context } => match context {
                Some(context) => self.show_warning(&format!("{message}: {context}")),
                None => self.show_warning(message),
            },
            GeneralEvent::Error { message, details } => match details {
                Some(details) => self.show_error(&format!("{message}: {details}")),
                None => self.show_error(message),
            },
            GeneralEvent::DebugLog { message } => self.show_debug(message),
            GeneralEvent::OperationStarted { operation } => {
                self.show_debug(&format!("{operation} started"));
            }
            GeneralEvent::OperationCompleted { operation, success } => {
                self.show_debug(&format!("{operation} finished (success: {success})"));
            }
            // The final error is printed once by main
            GeneralEvent::OperationFailed { .. } => {}
        }
    }

    /// Handle download started event
    fn handle_download_started(&mut self, url: &str, total_size: Option<u64>, resume_offset: u64) {
        let pb = match total_size {
            Some(total) => ProgressBar::new(total),
            None => ProgressBar::new_spinner(),
        };

        let template = if total_size.is_some() {
            BAR_TEMPLATE
        } else {
            SPINNER_TEMPLATE
        };
        if let Ok(style) = ProgressStyle::default_bar().template(template) {
            pb.set_style(style.progress_chars("#>-"));
        }

        pb.set_position(resume_offset);
        pb.set_message(format!("Downloading {}", file_name(url)));

        // A retry restarts the same URL; drop the stale bar first
        if let Some(old) = self.download_bars.remove(url) {
            old.finish_and_clear();
        }
        let pb = self.multi_progress.add(pb);
        self.download_bars.insert(url.to_string(), pb);
    }

    /// Handle download progress event
    fn handle_download_progress(&mut self, url: &str, bytes_downloaded: u64, total_bytes: Option<u64>) {
        if let Some(pb) = self.download_bars.get(url) {
            if let Some(total) = total_bytes {
                pb.set_length(total);
            }
            pb.set_position(bytes_downloaded);
        }
    }

    /// Handle download completed event
    fn handle_download_completed(&mut self, url: &str) {
        if let Some(pb) = self.download_bars.remove(url) {
            pb.finish_and_clear();
        }
    }

    /// Handle download failed event
    fn handle_download_failed(&mut self, url: &str, failure: &FailureContext) {
        if let Some(pb) = self.download_bars.remove(url) {
            pb.abandon_with_message(format!("Failed: {}", failure.message));
        }
    }

    fn show_status(&self, message: &str) {
        self.println(message, None);
    }

    fn show_success(&self, message: &str) {
        self.println(message, Some(Style::new().green()));
    }

    fn show_warning(&self, message: &str) {
        self.println(&format!("warning: {message}"), Some(Style::new().yellow()));
    }

    fn show_error(&self, message: &str) {
        self.println(&format!("error: {message}"), Some(Style::new().red().bold()));
    }

    fn show_debug(&self, message: &str) {
        if self.debug_enabled {
            self.println(message, Some(Style::new().dim()));
        }
    }

    /// Print above the progress bars
    fn println(&self, message: &str, style: Option<Style>) {
        let line = match style {
            Some(style) if self.colors_enabled => style.apply_to(message).to_string(),
            _ => message.to_string(),
        };
        self.multi_progress.println(line).unwrap_or(());
    }
}

/// Last path segment of a URL, for compact messages
fn file_name(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(url)
}
