//! Configuration and result structures for downloads

use crate::client::NetConfig;
use arcdl_hash::Hash;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for a [`Fetcher`](super::Fetcher)
#[derive(Clone, Debug)]
pub struct FetchConfig {
    /// Client, timeout and retry settings
    pub net: NetConfig,
    /// Bytes buffered before each write and progress report (default: 256KB)
    pub chunk_size: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            net: NetConfig::default(),
            chunk_size: 256 * 1024,
        }
    }
}

impl FetchConfig {
    /// Build from a loaded configuration file
    #[must_use]
    pub fn from_config(config: &arcdl_config::Config) -> Self {
        Self {
            net: NetConfig::from_config(&config.network),
            chunk_size: config.network.chunk_size.max(1),
        }
    }
}

/// Result of a completed fetch
#[derive(Debug, Clone, Serialize)]
pub struct FetchResult {
    /// Finalized destination file
    pub path: PathBuf,
    pub size: u64,
    /// Digest of the finalized file (the expected algorithm, SHA-256 otherwise)
    pub hash: Hash,
    /// Whether `hash` was checked against an expected value
    pub verified: bool,
    /// Largest offset any attempt resumed from; zero if nothing was resumed
    pub resumed_from: u64,
    /// Whole-transfer attempts used
    pub attempts: u32,
    pub elapsed: Duration,
}
