//! Download orchestration
//!
//! This module turns a classified GitHub URL into files on disk.
//!
//! # Overview
//!
//! 1. **Configuration**: [`config::DownloadConfig`] is built once per run
//! 2. **Engine**: [`engine::GithubDownloader`] classifies the root URL and
//!    either downloads one file or walks the directory tree
//! 3. **Admission**: [`coordinator::Coordinator`] caps simultaneous downloads
//!    with a counting semaphore
//! 4. **Transfer**: [`worker::DownloadWorker`] streams one file to disk
//! 5. **Progress**: [`progress::ProgressSink`] receives byte counts and one
//!    terminal event per file
//!
//! # Quick Start
//!
//! ```no_run
//! use github_tree_downloader::downloader::{DownloadConfig, GithubDownloader};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DownloadConfig::new("./download").with_max_concurrency(5);
//! let downloader = GithubDownloader::new(config)?;
//! let summary = downloader
//!     .run("https://github.com/acme/widgets/tree/main/docs")
//!     .await?;
//! println!("{} files written", summary.files_completed);
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Directory listing failures are fatal and surface as
//! [`engine::EngineError`]. Per-file failures ([`DownloadError`]) abort only
//! that file's progress and are counted in [`coordinator::RunSummary`].
//! Nothing is retried.

use std::path::{Path, PathBuf};

use crate::location::UrlError;

pub mod config;
pub mod coordinator;
pub mod engine;
pub mod progress;
pub mod worker;

pub use config::DownloadConfig;
pub use coordinator::{Coordinator, RunSummary};
pub use engine::{EngineError, GithubDownloader};
pub use progress::{
    BarSafeWriter, IndicatifReporter, NoProgress, ProgressReporter, ProgressSink, TaskProgress,
};
pub use worker::{DownloadWorker, DownloadedFile};

/// Per-file download errors
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// Source URL could not be rewritten to a raw-content URL
    #[error(transparent)]
    InvalidUrl(#[from] UrlError),

    /// Transport failure while requesting or reading the body
    #[error("error making http request for {url}: {message}")]
    TransportFailed {
        /// Requested URL
        url: String,
        /// Underlying error
        message: String,
    },

    /// Raw host answered with anything but 200
    #[error("error downloading {url}: bad status {status}")]
    BadStatus {
        /// Requested URL
        url: String,
        /// Status line, e.g. "404 Not Found"
        status: String,
    },

    /// Creating directories, creating the file or writing to it failed
    #[error("local IO error on {}: {message}", path.display())]
    LocalIoFailed {
        /// Path being created or written
        path: PathBuf,
        /// Underlying error
        message: String,
    },
}

impl DownloadError {
    pub(crate) fn local_io(path: &Path, err: std::io::Error) -> Self {
        Self::LocalIoFailed {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}
