//! Single-step operations: fetch, extract, find, hash

use crate::{FetchRequest, FindReport, HashReport, OpsCtx};
use arcdl_errors::Error;
use arcdl_events::{EventEmitter, EventProgress, FailureContext};
use arcdl_extract::{ExtractReport, ExtractRequest};
use arcdl_hash::{Hash, HashAlgorithm};
use arcdl_net::{validate_url, FetchResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Fallback file name when the URL path has none
const DEFAULT_FILE_NAME: &str = "download.zip";

/// Default destination for `url`: its last path segment in the download dir
///
/// # Errors
///
/// Returns an error if the URL is invalid.
pub fn default_destination(ctx: &OpsCtx, url: &str) -> Result<PathBuf, Error> {
    let url = validate_url(url)?;
    let name = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .unwrap_or(DEFAULT_FILE_NAME)
        .to_string();
    Ok(ctx.config.download_dir().join(name))
}

/// Download a file, resuming and verifying as requested
///
/// # Errors
///
/// Returns the fetcher's error; see [`arcdl_net::Fetcher::fetch`].
pub async fn fetch(ctx: &OpsCtx, request: &FetchRequest) -> Result<FetchResult, Error> {
    let dest = match &request.dest {
        Some(dest) => dest.clone(),
        None => default_destination(ctx, &request.url)?,
    };

    ctx.emit_operation_started("fetch");
    let fetcher = ctx
        .fetcher
        .clone()
        .with_progress(Arc::new(EventProgress::new(&request.url, ctx.tx.clone())));
    let result = fetcher
        .fetch(
            &request.url,
            &dest,
            request.expected_hash.as_ref(),
            request.resume,
        )
        .await;

    finish(ctx, "fetch", result)
}

/// Extract an archive into a directory
///
/// # Errors
///
/// Returns the extractor's error; see [`arcdl_extract::Extractor`].
pub async fn extract(
    ctx: &OpsCtx,
    archive: &Path,
    dest: &Path,
    overwrite: bool,
) -> Result<ExtractReport, Error> {
    ctx.emit_operation_started("extract");
    let result = ctx
        .extractor
        .extract(ExtractRequest::new(archive, dest).with_overwrite(overwrite))
        .await;
    finish(ctx, "extract", result)
}

/// List files under `root` matching a glob
///
/// # Errors
///
/// Returns an error for a malformed pattern.
pub fn find(root: &Path, pattern: &str) -> Result<FindReport, Error> {
    Ok(FindReport {
        root: root.to_path_buf(),
        pattern: pattern.to_string(),
        matches: arcdl_extract::find_files(root, pattern)?,
    })
}

/// Digest a local file
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub async fn hash(path: &Path, algorithm: HashAlgorithm) -> Result<HashReport, Error> {
    let digest = Hash::hash_file(path, algorithm).await?;
    Ok(HashReport {
        path: path.to_path_buf(),
        algorithm,
        hash: digest.to_hex(),
    })
}

pub(crate) fn finish<T>(ctx: &OpsCtx, operation: &str, result: Result<T, Error>) -> Result<T, Error> {
    match &result {
        Ok(_) => ctx.emit_operation_completed(operation, true),
        Err(e) => ctx.emit_operation_failed(operation, FailureContext::from_error(e)),
    }
    result
}
