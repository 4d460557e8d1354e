//! Main downloader orchestration and `Fetcher` implementation

use super::config::{FetchConfig, FetchResult};
use super::resume::{finalize, get_resume_offset, remove_if_exists};
use super::stream::{open_target, stream_body, StreamParams, WriteMode};
use super::transfer::Transfer;
use super::validation::{
    classify_range_response, content_length, ensure_success, validate_url, RangeOutcome,
};
use crate::client::NetClient;
use arcdl_errors::{Error, NetworkError, StorageError};
use arcdl_events::{
    AppEvent, DownloadEvent, EventEmitter, EventSender, FailureContext, NoProgress, ProgressSink,
};
use arcdl_hash::{Hash, HashAlgorithm};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_RANGES, RANGE};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::fs as tokio_fs;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Resumable, verifying downloader
///
/// Two fetches into the same destination at the same time share one partial
/// file; callers must not do that.
#[derive(Clone)]
pub struct Fetcher {
    client: NetClient,
    config: FetchConfig,
    progress: Arc<dyn ProgressSink>,
    tx: Option<EventSender>,
}

/// Result of one whole-transfer attempt
enum Attempt {
    /// This file holds the complete resource
    Done(PathBuf),
    /// The body stream broke off; the partial file was kept
    Interrupted(Error),
}

impl EventEmitter for Fetcher {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl Fetcher {
    /// Create a new fetcher
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let client = NetClient::new(config.net.clone())?;
        Ok(Self {
            client,
            config,
            progress: Arc::new(NoProgress),
            tx: None,
        })
    }

    /// Create with default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn with_defaults() -> Result<Self, Error> {
        Self::new(FetchConfig::default())
    }

    /// Report per-chunk progress to `sink`
    #[must_use]
    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = sink;
        self
    }

    /// Emit download lifecycle events on `tx`
    #[must_use]
    pub fn with_events(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Stop between chunks and during backoff once `token` is cancelled
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.client = self.client.with_cancellation(token);
        self
    }

    #[must_use]
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Download `url` to `dest`, resuming from `<dest>.part` when `resume`
    ///
    /// # Errors
    ///
    /// - `NetworkError::HttpError` for a terminal error status
    /// - other `NetworkError`s once transport retries are exhausted
    /// - `NetworkError::ChecksumMismatch` if the finished file does not match
    ///   `expected_hash` (the file is left in place)
    /// - `Error::Cancelled` if cancelled; the partial file is kept
    /// - storage and I/O errors from the filesystem
    pub async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        expected_hash: Option<&Hash>,
        resume: bool,
    ) -> Result<FetchResult, Error> {
        let started = Instant::now();
        let url = validate_url(url)?;

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio_fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::from_io_with_path(&e, parent))?;
        }

        let mut transfer = Transfer::new(url, dest, expected_hash.cloned(), resume)?;
        let max_attempts = self.config.net.retry.max_attempts.max(1);
        let mut attempt = 1;
        let mut resumed_from = 0;

        let completed = loop {
            let outcome = self.attempt(&mut transfer).await;
            resumed_from = resumed_from.max(transfer.resumed);

            match outcome {
                Ok(Attempt::Done(path)) => break path,
                Ok(Attempt::Interrupted(e)) if attempt < max_attempts => {
                    let delay = self.config.net.retry.backoff_delay(attempt);
                    debug!(url = %transfer.url, attempt, ?delay, error = %e, "transfer interrupted, retrying");
                    self.emit_download_retrying(
                        transfer.url.as_str(),
                        attempt,
                        max_attempts,
                        e.to_string(),
                        delay,
                    );
                    if let Err(e) = self.client.sleep(delay).await {
                        return Err(self.fail(&transfer, e).await);
                    }
                    attempt += 1;
                }
                Ok(Attempt::Interrupted(e)) | Err(e) => return Err(self.fail(&transfer, e).await),
            }
        };

        if completed != transfer.partial {
            // Restarted into a fresh file; the old partial is stale
            remove_if_exists(&transfer.partial).await?;
        }
        finalize(&completed, &transfer.dest).await?;

        let size = tokio_fs::metadata(&transfer.dest)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, &transfer.dest))?
            .len();

        let algorithm = expected_hash.map_or(HashAlgorithm::Sha256, Hash::algorithm);
        let hash = Hash::hash_file(&transfer.dest, algorithm).await?;
        if let Some(expected) = expected_hash {
            if hash != *expected {
                self.emit(AppEvent::Download(DownloadEvent::HashMismatch {
                    url: transfer.url.to_string(),
                    path: transfer.dest.clone(),
                    expected: expected.to_hex(),
                    actual: hash.to_hex(),
                }));
                return Err(NetworkError::ChecksumMismatch {
                    expected: expected.to_hex(),
                    actual: hash.to_hex(),
                }
                .into());
            }
        }

        let elapsed = started.elapsed();
        self.emit_download_completed(transfer.url.as_str(), transfer.dest.clone(), size, elapsed);

        Ok(FetchResult {
            path: transfer.dest,
            size,
            hash,
            verified: expected_hash.is_some(),
            resumed_from,
            attempts: attempt,
            elapsed,
        })
    }

    /// Report a failed transfer and hand the error back
    async fn fail(&self, transfer: &Transfer, error: Error) -> Error {
        let bytes_downloaded = get_resume_offset(&transfer.partial).await.unwrap_or(0);
        self.emit(AppEvent::Download(DownloadEvent::Failed {
            url: transfer.url.to_string(),
            bytes_downloaded,
            failure: FailureContext::from_error(&error),
        }));
        error
    }

    /// Best-effort HEAD to learn the resource size
    async fn preflight(&self, transfer: &Transfer) -> Option<u64> {
        match self.client.head(&transfer.url).await {
            Ok(response) if response.status().is_success() => {
                let total = content_length(response.headers());
                debug!(
                    url = %transfer.url,
                    ?total,
                    accept_ranges = ?response.headers().get(ACCEPT_RANGES),
                    "preflight"
                );
                total
            }
            Ok(response) => {
                debug!(url = %transfer.url, status = %response.status(), "preflight rejected");
                None
            }
            Err(Error::Cancelled) => None,
            Err(e) => {
                warn!(url = %transfer.url, error = %e, "preflight failed, size unknown");
                None
            }
        }
    }

    /// One whole-transfer attempt: resume negotiation, then streaming
    async fn attempt(&self, transfer: &mut Transfer) -> Result<Attempt, Error> {
        if self.client.cancellation().is_cancelled() {
            return Err(Error::Cancelled);
        }

        transfer.resumed = 0;
        let mut offset = if transfer.resume {
            get_resume_offset(&transfer.partial).await?
        } else {
            0
        };

        let preflight_total = self.preflight(transfer).await;
        if let (true, Some(total)) = (offset > 0, preflight_total) {
            if offset == total {
                debug!(url = %transfer.url, offset, "partial file already complete");
                transfer.offset = offset;
                transfer.resumed = offset;
                transfer.total_size = Some(total);
                return Ok(Attempt::Done(transfer.partial.clone()));
            }
            if offset > total {
                debug!(url = %transfer.url, offset, total, "partial file larger than resource, restarting");
                offset = 0;
            }
        }
        transfer.offset = offset;
        transfer.total_size = preflight_total;

        let (response, target, mode, start) = if offset > 0 {
            self.emit(AppEvent::Download(DownloadEvent::Resuming {
                url: transfer.url.to_string(),
                resume_offset: offset,
                total_size: preflight_total,
            }));

            let mut headers = HeaderMap::new();
            let range = HeaderValue::from_str(&format!("bytes={offset}-"))
                .map_err(|e| Error::internal(e.to_string()))?;
            headers.insert(RANGE, range);

            let response = self
                .client
                .get_with_headers(&transfer.url, headers)
                .await?;
            let status = response.status();

            match classify_range_response(status, response.headers(), offset)? {
                RangeOutcome::Honoured { total } => {
                    debug!(url = %transfer.url, offset, ?total, "range honoured");
                    transfer.total_size = transfer.total_size.or(total);
                    transfer.resumed = offset;
                    (response, transfer.partial.clone(), WriteMode::Append, offset)
                }
                RangeOutcome::Ignored { total } => {
                    warn!(url = %transfer.url, offset, "server ignored range request, restarting from 0");
                    self.emit(AppEvent::Download(DownloadEvent::RangeIgnored {
                        url: transfer.url.to_string(),
                        status: status.as_u16(),
                    }));
                    transfer.total_size = transfer.total_size.or(total);
                    (response, transfer.restart.clone(), WriteMode::Truncate, 0)
                }
                RangeOutcome::AlreadyComplete => {
                    debug!(url = %transfer.url, offset, "range not satisfiable, partial file is complete");
                    transfer.total_size = Some(offset);
                    transfer.resumed = offset;
                    return Ok(Attempt::Done(transfer.partial.clone()));
                }
                RangeOutcome::Restart => {
                    warn!(url = %transfer.url, offset, %status, "range rejected, restarting from 0");
                    self.emit(AppEvent::Download(DownloadEvent::RangeIgnored {
                        url: transfer.url.to_string(),
                        status: status.as_u16(),
                    }));
                    drop(response);
                    let response = self.client.get(&transfer.url).await?;
                    ensure_success(response.status())?;
                    transfer.total_size = content_length(response.headers());
                    (response, transfer.restart.clone(), WriteMode::Truncate, 0)
                }
            }
        } else {
            let response = self.client.get(&transfer.url).await?;
            ensure_success(response.status())?;
            transfer.total_size = transfer
                .total_size
                .or_else(|| content_length(response.headers()));
            (response, transfer.partial.clone(), WriteMode::Truncate, 0)
        };

        self.emit_download_started(transfer.url.as_str(), transfer.total_size, start);

        let mut file = open_target(&target, mode).await?;
        let params = StreamParams {
            url: &transfer.url,
            start,
            total: transfer.total_size,
            chunk_size: self.config.chunk_size,
            read_timeout: self.config.net.read_timeout,
            progress: self.progress.as_ref(),
            cancel: self.client.cancellation(),
        };
        let outcome = stream_body(response, &mut file, &params).await?;
        drop(file);

        let error = match (outcome.error, transfer.total_size) {
            (Some(e), _) => Some(e),
            (None, Some(total)) if outcome.bytes_on_disk < total => Some(
                NetworkError::DownloadFailed(format!(
                    "connection closed after {} of {total} bytes",
                    outcome.bytes_on_disk
                ))
                .into(),
            ),
            (None, _) => None,
        };

        match error {
            None => Ok(Attempt::Done(target)),
            Some(e) => {
                if target == transfer.restart {
                    self.salvage_restart(transfer, outcome.bytes_on_disk).await?;
                }
                match e {
                    Error::Network(ref net) if net.is_transient() => Ok(Attempt::Interrupted(e)),
                    other => Err(other),
                }
            }
        }
    }

    /// Keep whichever of the restart file and the old partial holds more of
    /// the resource, as the partial file
    async fn salvage_restart(&self, transfer: &Transfer, restart_len: u64) -> Result<(), Error> {
        if restart_len > transfer.offset {
            finalize(&transfer.restart, &transfer.partial).await
        } else {
            remove_if_exists(&transfer.restart).await
        }
    }
}
