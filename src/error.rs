//! Download error types

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network failure during the request or while reading the body stream.
    #[error("download request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-success HTTP status on the initial response.
    #[error("download failed: {status} - {body}")]
    Status { status: StatusCode, body: String },

    #[error("failed to create directory: {0}")]
    CreateDir(std::io::Error),

    #[error("failed to create temp file: {0}")]
    CreateFile(std::io::Error),

    #[error("failed to write chunk: {0}")]
    WriteFile(std::io::Error),

    #[error("failed to flush file: {0}")]
    FlushFile(std::io::Error),

    /// Rename of the fully-written temp file onto the final path failed.
    #[error("failed to finalize file: {0}")]
    Commit(std::io::Error),

    #[error("download cancelled")]
    Cancelled,
}

impl DownloadError {
    /// Cancellations are user-initiated; hosts use this to skip error display.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DownloadError::Cancelled)
    }
}
