//! Streaming file-download engine for model-hub resources
//!
//! Embeds in a host application that resolves hub references (repo,
//! version) into concrete URLs, then calls in here to:
//! - stream the resource to disk in chunks, through a `.tmp` file that is
//!   renamed into place only once fully written;
//! - report progress percentages to a narrow sink interface;
//! - support mid-flight cancellation keyed by a caller-supplied job id,
//!   typically driven from an HTTP endpoint on the host's control surface.
//!
//! Whatever happens - success, transport failure, write failure, or
//! cancellation - no partial file is left at the final path and the temp
//! file is gone by the time the call returns.

pub mod commands;
pub mod error;
pub mod filename;
pub mod registry;
pub mod types;
mod worker;

pub use commands::handle_cancel_request;
pub use error::DownloadError;
pub use filename::{extract_filename, sanitize_filename};
pub use registry::CancelRegistry;
pub use types::{CancelRequest, CancelResponse, DownloadOutcome, DownloadRequest, ProgressSink};
pub use worker::start_download;
