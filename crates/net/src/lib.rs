#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network operations for arcdl
//!
//! This crate handles all HTTP operations: a pooled client with bounded
//! retry and backoff, and the resumable [`Fetcher`] that streams a remote
//! archive to disk, finalizes it atomically and verifies its digest.

mod client;
mod download;
mod retry;

pub use client::{NetClient, NetConfig};
pub use download::{
    partial_path, validate_url, ContentRange, FetchConfig, FetchResult, Fetcher, Transfer,
};
pub use retry::RetryPolicy;

use arcdl_errors::Error;
use arcdl_hash::Hash;
use std::path::Path;

/// Download a file with default settings
///
/// # Errors
///
/// Returns an error if the URL is invalid, the download fails, the digest
/// does not match, or there are I/O errors while writing the file.
pub async fn download_file(
    url: &str,
    dest: &Path,
    expected_hash: Option<&Hash>,
) -> Result<FetchResult, Error> {
    Fetcher::with_defaults()?
        .fetch(url, dest, expected_hash, true)
        .await
}
