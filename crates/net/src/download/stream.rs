//! Low-level streaming download mechanics

use arcdl_errors::{Error, NetworkError};
use arcdl_events::ProgressSink;
use bytes::BytesMut;
use futures::StreamExt;
use std::path::Path;
use std::time::Duration;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use url::Url;

/// How the target file is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum WriteMode {
    Append,
    Truncate,
}

/// Parameters for one streamed body
pub(super) struct StreamParams<'a> {
    pub url: &'a Url,
    /// Bytes already in the target file
    pub start: u64,
    pub total: Option<u64>,
    pub chunk_size: usize,
    pub read_timeout: Duration,
    pub progress: &'a dyn ProgressSink,
    pub cancel: &'a CancellationToken,
}

/// Outcome of streaming a body
pub(super) struct StreamOutcome {
    /// Bytes in the target file afterwards, including `start`
    pub bytes_on_disk: u64,
    pub error: Option<Error>,
}

pub(super) async fn open_target(path: &Path, mode: WriteMode) -> Result<File, Error> {
    let mut options = OpenOptions::new();
    options.create(true);
    match mode {
        WriteMode::Append => options.append(true),
        WriteMode::Truncate => options.write(true).truncate(true),
    };
    options
        .open(path)
        .await
        .map_err(|e| Error::io_with_path(&e, path))
}

/// Stream `response` into `file` in `chunk_size` writes
///
/// Received bytes are buffered until a full chunk is available, then written
/// and reported. Whatever is buffered when the stream ends, fails or is
/// cancelled is still written, so the file always holds every byte received.
/// Transport errors come back in [`StreamOutcome::error`]; disk errors are
/// returned directly.
pub(super) async fn stream_body(
    response: reqwest::Response,
    file: &mut File,
    params: &StreamParams<'_>,
) -> Result<StreamOutcome, Error> {
    let chunk_size = params.chunk_size.max(1);
    let mut stream = response.bytes_stream();
    let mut buffer = BytesMut::with_capacity(chunk_size);
    let mut written = params.start;

    let error = loop {
        let next = tokio::select! {
            () = params.cancel.cancelled() => break Some(Error::Cancelled),
            next = tokio::time::timeout(params.read_timeout, stream.next()) => next,
        };

        match next {
            Ok(Some(Ok(bytes))) => {
                buffer.extend_from_slice(&bytes);
                while buffer.len() >= chunk_size {
                    let chunk = buffer.split_to(chunk_size);
                    write_chunk(file, &chunk, &mut written, params).await?;
                }
            }
            Ok(Some(Err(e))) => {
                break Some(NetworkError::DownloadFailed(e.to_string()).into());
            }
            Ok(None) => break None,
            Err(_) => {
                break Some(
                    NetworkError::Timeout {
                        url: params.url.to_string(),
                    }
                    .into(),
                );
            }
        }
    };

    if !buffer.is_empty() {
        let chunk = buffer.split();
        write_chunk(file, &chunk, &mut written, params).await?;
    }
    file.flush().await?;
    file.sync_data().await?;

    Ok(StreamOutcome {
        bytes_on_disk: written,
        error,
    })
}

async fn write_chunk(
    file: &mut File,
    chunk: &[u8],
    written: &mut u64,
    params: &StreamParams<'_>,
) -> Result<(), Error> {
    file.write_all(chunk).await?;
    *written += chunk.len() as u64;
    params.progress.on_progress(*written, params.total);
    Ok(())
}
