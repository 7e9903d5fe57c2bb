//! Single-file download worker
//!
//! Fetches one file from the raw-content host and streams it to disk while
//! reporting progress. Failures are isolated to the file: they abort its
//! progress handle and are logged, and the partially written file (if any) is
//! left in place. There are no retries.

use futures_util::StreamExt;
use reqwest::{Client, StatusCode};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::config::DownloadConfig;
use super::progress::TaskProgress;
use super::DownloadError;
use crate::location::{last_segment, rebase_url, to_raw_content_url};
use crate::DownloadTask;

/// A file that was written completely
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    /// Destination on disk
    pub path: PathBuf,
    /// Bytes written
    pub bytes: u64,
}

/// Downloads individual files into the configured output directory
#[derive(Debug, Clone)]
pub struct DownloadWorker {
    client: Client,
    config: Arc<DownloadConfig>,
}

impl DownloadWorker {
    /// Create a worker sharing `client` and `config`
    pub fn new(client: Client, config: Arc<DownloadConfig>) -> Self {
        Self { client, config }
    }

    /// Download `task`, reporting through `progress`
    ///
    /// The progress handle is always terminated: completed on success, aborted
    /// on any error.
    pub async fn download(
        &self,
        task: &DownloadTask,
        mut progress: TaskProgress,
    ) -> Result<DownloadedFile, DownloadError> {
        match self.fetch_to_disk(task, &mut progress).await {
            Ok(file) => {
                progress.complete(file.bytes);
                debug!("Downloaded {} ({} bytes)", file.path.display(), file.bytes);
                Ok(file)
            }
            Err(e) => {
                progress.abort();
                warn!("Error downloading {}: {}", task.source_url, e);
                Err(e)
            }
        }
    }

    async fn fetch_to_disk(
        &self,
        task: &DownloadTask,
        progress: &mut TaskProgress,
    ) -> Result<DownloadedFile, DownloadError> {
        let raw_url = to_raw_content_url(&task.source_url)?;
        let fetch_url = if self.config.rebases_raw_urls() {
            rebase_url(&raw_url, self.config.raw_base_url())?
        } else {
            raw_url.clone()
        };

        debug!("GET {}", fetch_url);
        let response = self
            .client
            .get(&fetch_url)
            .send()
            .await
            .map_err(|e| DownloadError::TransportFailed {
                url: fetch_url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(DownloadError::BadStatus {
                url: fetch_url,
                status: status.to_string(),
            });
        }

        let path = resolve_destination(self.config.output_dir(), &task.relative_path, &raw_url)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DownloadError::local_io(parent, e))?;
        }

        let mut file = File::create(&path)
            .await
            .map_err(|e| DownloadError::local_io(&path, e))?;

        match response.content_length().filter(|len| *len > 0) {
            Some(len) => {
                progress.set_total(len);
                let mut stream = response.bytes_stream();
                while let Some(chunk) = stream.next().await {
                    let chunk = chunk.map_err(|e| DownloadError::TransportFailed {
                        url: fetch_url.clone(),
                        message: e.to_string(),
                    })?;
                    file.write_all(&chunk)
                        .await
                        .map_err(|e| DownloadError::local_io(&path, e))?;
                    progress.advance(chunk.len() as u64);
                }
            }
            None => {
                // Length unknown: buffer the body to learn it before writing.
                let body = response
                    .bytes()
                    .await
                    .map_err(|e| DownloadError::TransportFailed {
                        url: fetch_url.clone(),
                        message: e.to_string(),
                    })?;
                progress.set_total(body.len() as u64);
                file.write_all(&body)
                    .await
                    .map_err(|e| DownloadError::local_io(&path, e))?;
                progress.advance(body.len() as u64);
            }
        }

        file.flush()
            .await
            .map_err(|e| DownloadError::local_io(&path, e))?;

        Ok(DownloadedFile {
            path,
            bytes: progress.transferred(),
        })
    }
}

/// Destination path for a download
///
/// An empty `relative_path` (single-file targets) falls back to the last
/// segment of the resolved raw URL. Paths that would escape `output_dir` are
/// rejected.
pub fn resolve_destination(
    output_dir: &Path,
    relative_path: &str,
    raw_url: &str,
) -> Result<PathBuf, DownloadError> {
    let relative = if relative_path.is_empty() {
        last_segment(raw_url)
    } else {
        relative_path
    };

    let relative = Path::new(relative);
    let is_safe = relative.components().next().is_some()
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !is_safe {
        return Err(DownloadError::LocalIoFailed {
            path: output_dir.join(relative),
            message: "relative path escapes the output directory".to_string(),
        });
    }

    Ok(output_dir.join(relative))
}
