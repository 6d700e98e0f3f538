//! Request, outcome and cancel-endpoint payload types

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One download request: where to fetch from and where the file ends up.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    /// Resolved source URL (hub adapters turn repo references into this).
    pub url: String,
    /// Directory the final file lands in. Created if missing.
    pub dest_dir: PathBuf,
    /// Final filename. When `None` the name is resolved from the response
    /// headers or the URL, then sanitized either way.
    pub filename: Option<String>,
    /// Replace an existing file at the final path instead of skipping.
    pub overwrite: bool,
    /// Registry key for cancellation. Downloads without an id cannot be
    /// cancelled externally.
    pub job_id: Option<String>,
    /// Extra query parameters appended to the GET (e.g. an API token).
    pub query: Vec<(String, String)>,
    /// Bearer token sent in the Authorization header when present.
    pub auth_token: Option<String>,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>, dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            dest_dir: dest_dir.into(),
            filename: None,
            overwrite: false,
            job_id: None,
            query: Vec::new(),
            auth_token: None,
        }
    }

    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn job_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }

    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}

/// Terminal outcome of a successful download call.
///
/// `AlreadyExists` is a recognized no-op, not an error: the target file was
/// present, overwrite was disabled, and nothing was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// File fully transferred and committed at this path.
    Completed(PathBuf),
    /// Existing file left untouched at this path.
    AlreadyExists(PathBuf),
}

impl DownloadOutcome {
    /// Final path in either case.
    pub fn path(&self) -> &PathBuf {
        match self {
            DownloadOutcome::Completed(p) => p,
            DownloadOutcome::AlreadyExists(p) => p,
        }
    }
}

/// Observer for transfer progress; receives a percentage in [0, 100].
///
/// Percentage events are only emitted when the total size is known. Values
/// are non-decreasing per job, with a final event at exactly 100 on commit.
pub trait ProgressSink: Send + Sync {
    fn set_progress(&self, percent: f64);
}

impl<F> ProgressSink for F
where
    F: Fn(f64) + Send + Sync,
{
    fn set_progress(&self, percent: f64) {
        self(percent)
    }
}

/// Body of a cancel request from the host's control surface.
#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    pub job_id: Option<String>,
}

/// Response payload for the cancel endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CancelResponse {
    /// "cancelled" | "not_found" | "bad_request"
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
