//! Resumable, verified downloads
//!
//! A transfer streams into `<dest>.part`, resumes from that file's length
//! with a byte-range request, renames it onto the destination once complete,
//! and finally checks the digest of the finished file.

mod config;
mod core;
mod resume;
mod stream;
mod transfer;
mod validation;

pub use config::{FetchConfig, FetchResult};
pub use core::Fetcher;
pub use resume::partial_path;
pub use transfer::Transfer;
pub use validation::{validate_url, ContentRange};
