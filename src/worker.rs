//! Transfer worker - streaming download with cancel checks and atomic commit

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::error::DownloadError;
use crate::filename::{extract_filename, sanitize_filename};
use crate::registry::CancelRegistry;
use crate::types::{DownloadOutcome, DownloadRequest, ProgressSink};

/// Write buffer size for downloads (1 MB) - reduces I/O operations and
/// bounds cancel latency to one buffered stretch of the stream.
const WRITE_BUFFER_SIZE: usize = 1024 * 1024;

/// Run one download to completion.
///
/// Registers the job id (when given) in `registry` before any network
/// activity and removes it again before returning, whatever the outcome, so
/// the registry only ever holds in-flight jobs. Removal rides a drop guard,
/// so it also runs when this future is dropped mid-transfer.
pub async fn start_download(
    client: &Client,
    registry: &CancelRegistry,
    request: DownloadRequest,
    progress: Option<&dyn ProgressSink>,
) -> Result<DownloadOutcome, DownloadError> {
    let cancel_flag = request.job_id.as_deref().map(|id| registry.register(id));
    let _cleanup = request
        .job_id
        .as_deref()
        .map(|id| RegistryCleanup { registry, id });

    run_transfer(client, &request, cancel_flag.as_deref(), progress).await
}

struct RegistryCleanup<'a> {
    registry: &'a CancelRegistry,
    id: &'a str,
}

impl Drop for RegistryCleanup<'_> {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}

async fn run_transfer(
    client: &Client,
    request: &DownloadRequest,
    cancel_flag: Option<&AtomicBool>,
    progress: Option<&dyn ProgressSink>,
) -> Result<DownloadOutcome, DownloadError> {
    // With a caller-supplied filename the existence check needs no network
    // request at all.
    if let Some(name) = &request.filename {
        let final_path = request.dest_dir.join(sanitize_filename(name));
        if final_path.exists() && !request.overwrite {
            log::info!(
                "File already exists and overwrite is disabled: {}",
                final_path.display()
            );
            return Ok(DownloadOutcome::AlreadyExists(final_path));
        }
    }

    log::info!("Starting download from: {}", request.url);

    let mut get = client.get(&request.url);
    if !request.query.is_empty() {
        get = get.query(&request.query);
    }
    if let Some(token) = &request.auth_token {
        get = get.bearer_auth(token);
    }

    let response = get.send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(DownloadError::Status { status, body });
    }

    let total_bytes = response.content_length().unwrap_or(0);

    let filename = match &request.filename {
        Some(name) => sanitize_filename(name),
        None => {
            let disposition = response
                .headers()
                .get(reqwest::header::CONTENT_DISPOSITION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            sanitize_filename(&extract_filename(disposition.as_deref(), &request.url))
        }
    };

    let final_path = request.dest_dir.join(&filename);
    if final_path.exists() && !request.overwrite {
        log::info!(
            "File already exists and overwrite is disabled: {}",
            final_path.display()
        );
        return Ok(DownloadOutcome::AlreadyExists(final_path));
    }

    tokio::fs::create_dir_all(&request.dest_dir)
        .await
        .map_err(DownloadError::CreateDir)?;

    let tmp_path = tmp_path_for(&final_path);
    log::info!("Downloading to: {}", final_path.display());

    // Armed until the rename lands, so the tmp file goes away on every
    // failure path, including this future being dropped mid-stream.
    let mut tmp_guard = TmpFileGuard::new(tmp_path.clone());

    stream_to_file(response, &tmp_path, total_bytes, cancel_flag, progress).await?;

    tokio::fs::rename(&tmp_path, &final_path)
        .await
        .map_err(DownloadError::Commit)?;
    tmp_guard.disarm();

    if let Some(sink) = progress {
        sink.set_progress(100.0);
    }

    log::info!("Download complete: {}", final_path.display());
    Ok(DownloadOutcome::Completed(final_path))
}

/// Stream the response body into the temp file through a write buffer,
/// checking the cancel flag and reporting progress at every chunk.
async fn stream_to_file(
    response: reqwest::Response,
    tmp_path: &Path,
    total_bytes: u64,
    cancel_flag: Option<&AtomicBool>,
    progress: Option<&dyn ProgressSink>,
) -> Result<(), DownloadError> {
    // A cancel that landed while the request was in flight is honored
    // before the first byte hits disk.
    if is_cancelled(cancel_flag) {
        return Err(DownloadError::Cancelled);
    }

    let mut file = File::create(tmp_path)
        .await
        .map_err(DownloadError::CreateFile)?;

    let mut stream = response.bytes_stream();
    let mut write_buffer: Vec<u8> = Vec::with_capacity(WRITE_BUFFER_SIZE);
    let mut downloaded: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        if is_cancelled(cancel_flag) {
            log::info!("Download cancelled after {} bytes", downloaded);
            return Err(DownloadError::Cancelled);
        }

        let chunk = chunk_result?;
        downloaded += chunk.len() as u64;
        write_buffer.extend_from_slice(&chunk);

        if write_buffer.len() >= WRITE_BUFFER_SIZE {
            file.write_all(&write_buffer)
                .await
                .map_err(DownloadError::WriteFile)?;
            write_buffer.clear();
        }

        // No percentage events when the total is unknown
        if total_bytes > 0 {
            if let Some(sink) = progress {
                let percent = (downloaded as f64 / total_bytes as f64) * 100.0;
                sink.set_progress(percent.min(100.0));
            }
        }
    }

    if !write_buffer.is_empty() {
        file.write_all(&write_buffer)
            .await
            .map_err(DownloadError::WriteFile)?;
    }

    file.flush().await.map_err(DownloadError::FlushFile)?;
    Ok(())
}

fn is_cancelled(cancel_flag: Option<&AtomicBool>) -> bool {
    cancel_flag.is_some_and(|flag| flag.load(Ordering::SeqCst))
}

fn tmp_path_for(final_path: &Path) -> PathBuf {
    let mut os = final_path.as_os_str().to_os_string();
    os.push(".tmp");
    PathBuf::from(os)
}

/// Best-effort temp file removal, disarmed once the rename commits. A
/// cleanup failure is logged rather than raised so it cannot mask the
/// original error.
struct TmpFileGuard {
    path: Option<PathBuf>,
}

impl TmpFileGuard {
    fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    fn disarm(&mut self) {
        self.path = None;
    }
}

impl Drop for TmpFileGuard {
    fn drop(&mut self) {
        let Some(path) = self.path.take() else { return };
        match std::fs::remove_file(&path) {
            Ok(()) => log::info!("Cleaned up temp file: {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove temp file {}: {}", path.display(), e),
        }
    }
}
