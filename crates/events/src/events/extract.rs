use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::FailureContext;

/// Archive extraction events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ExtractEvent {
    Started {
        archive: PathBuf,
        destination: PathBuf,
    },

    /// Every entry resolved inside the destination
    Validated { entries: usize },

    /// Previous destination contents removed because overwrite was requested
    DestinationCleared { destination: PathBuf },

    Completed {
        destination: PathBuf,
        files: usize,
        directories: usize,
    },

    Failed {
        archive: PathBuf,
        failure: FailureContext,
    },
}
