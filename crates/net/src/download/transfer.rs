//! Transfer descriptor

use super::resume::{partial_path, restart_path};
use arcdl_errors::Error;
use arcdl_hash::Hash;
use std::path::{Path, PathBuf};
use url::Url;

/// One download invocation
///
/// The partial path holds the bytes received so far and survives failures;
/// on success it is renamed onto `dest`.
#[derive(Debug, Clone)]
pub struct Transfer {
    pub url: Url,
    pub dest: PathBuf,
    pub partial: PathBuf,
    /// Used instead of `partial` when the server forces a restart from byte 0
    pub restart: PathBuf,
    pub resume: bool,
    pub expected_hash: Option<Hash>,
    /// Full resource size, once a server has reported it
    pub total_size: Option<u64>,
    /// Bytes already on disk when the current attempt started
    pub offset: u64,
    /// Bytes the current attempt kept from the partial file; zero unless the
    /// server honoured the range or the partial was already complete
    pub resumed: u64,
}

impl Transfer {
    /// Describe a transfer of `url` to `dest`
    ///
    /// # Errors
    ///
    /// Returns an error if `dest` has no file name.
    pub fn new(
        url: Url,
        dest: &Path,
        expected_hash: Option<Hash>,
        resume: bool,
    ) -> Result<Self, Error> {
        Ok(Self {
            url,
            dest: dest.to_path_buf(),
            partial: partial_path(dest)?,
            restart: restart_path(dest)?,
            resume,
            expected_hash,
            total_size: None,
            offset: 0,
            resumed: 0,
        })
    }
}
