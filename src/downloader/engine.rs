//! Download engine: classifies the root URL and drives the run
//!
//! A `blob` URL becomes a single download. A `tree` URL is expanded through
//! the [`TraversalQueue`] one directory at a time, and each file it yields is
//! handed to the [`Coordinator`], which caps how many downloads run at once.

use std::sync::Arc;
use tracing::{error, info};

use super::config::DownloadConfig;
use super::coordinator::{Coordinator, RunSummary};
use super::progress::{NoProgress, ProgressReporter, TaskProgress};
use super::worker::DownloadWorker;
use crate::github::{build_http_client, DirectoryLister, GithubContentsClient, ListError};
use crate::location::{last_segment, EntryKind, GithubLocation, UrlError};
use crate::traversal::TraversalQueue;
use crate::DownloadTask;

/// Fatal run errors
///
/// Per-file failures are not fatal; they are counted in [`RunSummary`].
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Root URL is not a supported GitHub URL
    #[error(transparent)]
    InvalidUrl(#[from] UrlError),

    /// A directory listing failed; traversal stopped
    #[error("error listing GitHub directory contents: {0}")]
    Listing(#[from] ListError),

    /// HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Downloads a GitHub file or directory tree into the configured output directory
pub struct GithubDownloader<L = GithubContentsClient> {
    config: Arc<DownloadConfig>,
    lister: L,
    worker: DownloadWorker,
    reporter: Arc<dyn ProgressReporter>,
}

impl GithubDownloader {
    /// Create a downloader talking to the configured GitHub endpoints
    pub fn new(config: DownloadConfig) -> Result<Self, EngineError> {
        let client = build_http_client(config.user_agent())
            .map_err(|e| EngineError::HttpClient(e.to_string()))?;
        let lister = GithubContentsClient::new(client.clone(), config.api_base_url());
        let config = Arc::new(config);

        Ok(Self {
            worker: DownloadWorker::new(client, config.clone()),
            config,
            lister,
            reporter: Arc::new(NoProgress),
        })
    }
}

impl<L: DirectoryLister> GithubDownloader<L> {
    /// Replace the directory lister
    pub fn with_lister<M: DirectoryLister>(self, lister: M) -> GithubDownloader<M> {
        GithubDownloader {
            config: self.config,
            lister,
            worker: self.worker,
            reporter: self.reporter,
        }
    }

    /// Report per-file progress through `reporter`
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Configuration in use
    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Download whatever `url` points at
    ///
    /// Returns once every admitted download has terminated. Individual file
    /// failures are logged and counted; only URL and listing failures are
    /// returned as errors. Surrounding whitespace in `url` is ignored.
    pub async fn run(&self, url: &str) -> Result<RunSummary, EngineError> {
        let url = url.trim();
        let location = GithubLocation::classify(url)?;
        info!(
            "Downloading {} into {}",
            location,
            self.config.output_dir().display()
        );

        let summary = match location.kind() {
            EntryKind::File => self.download_file(url).await?,
            EntryKind::Directory => self.download_tree(url).await?,
        };

        info!(
            "Finished: {}/{} files downloaded, {} failed, {} bytes",
            summary.files_completed,
            summary.files_dispatched,
            summary.files_failed,
            summary.bytes_written
        );
        Ok(summary)
    }

    async fn download_file(&self, url: &str) -> Result<RunSummary, EngineError> {
        let mut coordinator = Coordinator::new(self.config.max_concurrency());
        let task = DownloadTask {
            source_url: url.to_string(),
            relative_path: String::new(),
        };
        self.dispatch(&mut coordinator, task).await;
        Ok(coordinator.wait_all().await)
    }

    async fn download_tree(&self, url: &str) -> Result<RunSummary, EngineError> {
        let mut queue = TraversalQueue::new(url);
        let mut coordinator = Coordinator::new(self.config.max_concurrency());

        loop {
            match queue.next_task(&self.lister).await {
                Ok(Some(task)) => self.dispatch(&mut coordinator, task).await,
                Ok(None) => break,
                Err(e) => {
                    error!("Error listing github dir contents: {}", e);
                    // Nothing new is admitted, but downloads already running finish.
                    let drained = coordinator.wait_all().await;
                    info!(
                        "Stopped after listing failure: {}/{} dispatched files downloaded",
                        drained.files_completed, drained.files_dispatched
                    );
                    return Err(e.into());
                }
            }
        }

        info!(
            "Traversal complete: {} directories expanded, {} files dispatched",
            queue.directories_expanded(),
            coordinator.dispatched()
        );
        Ok(coordinator.wait_all().await)
    }

    async fn dispatch(&self, coordinator: &mut Coordinator, task: DownloadTask) {
        let label = if task.relative_path.is_empty() {
            last_segment(&task.source_url).to_string()
        } else {
            task.relative_path.clone()
        };
        let reporter = self.reporter.clone();
        let worker = self.worker.clone();

        // The sink is created inside the job, so a bar only appears once a slot is held.
        coordinator
            .dispatch(async move {
                let progress = TaskProgress::new(reporter.start_task(&label));
                worker.download(&task, progress).await
            })
            .await;
    }
}
