//! Settings for where and how department photos are stored.

use std::path::PathBuf;

/// The default upper bound on the size of an uploaded photo, in bytes.
pub const DEFAULT_MAX_FILE_UPLOAD: u64 = 1_000_000;

/// Controls how photo uploads are accepted and stored.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadConfig {
    /// The largest photo accepted, in bytes.
    pub max_file_size: u64,
    /// The directory photos are written to and served from.
    pub upload_path: PathBuf,
}

impl UploadConfig {
    /// Create a config for photos of at most `max_file_size` bytes stored under `upload_path`.
    pub fn new(max_file_size: u64, upload_path: impl Into<PathBuf>) -> Self {
        Self {
            max_file_size,
            upload_path: upload_path.into(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_UPLOAD, "./public/uploads")
    }
}
