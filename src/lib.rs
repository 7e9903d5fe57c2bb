//! # GitHub Tree Downloader Library
//!
//! Recursively downloads a file or directory referenced by a public GitHub web
//! URL, preserving relative paths, with bounded parallelism and per-file
//! progress reporting.
//!
//! ## Quick Start
//!
//! ```no_run
//! use github_tree_downloader::downloader::{DownloadConfig, GithubDownloader};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = GithubDownloader::new(DownloadConfig::new("/tmp/out"))?;
//!
//! // Writes /tmp/out/docs/... mirroring the repository layout
//! downloader
//!     .run("https://github.com/acme/widgets/tree/main/docs")
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`location`] - GitHub URL classification and raw-content rewriting
//! - [`github`] - Contents API directory listing
//! - [`traversal`] - Breadth-first expansion into download tasks
//! - [`downloader`] - Admission control, file transfer and progress
//! - [`cli`] - Command-line front end
//!
//! Directory listings are issued one at a time in breadth-first order. File
//! downloads run concurrently, capped by a counting semaphore (5 by default).
//! A listing failure stops the traversal; a download failure only affects its
//! own file.

#![warn(missing_docs)]
#![warn(clippy::all)]

use location::EntryKind;

/// CLI command implementation
pub mod cli;

/// Download orchestration
pub mod downloader;

/// GitHub contents API access
pub mod github;

/// GitHub URL parsing and rewriting
pub mod location;

/// Breadth-first directory traversal
pub mod traversal;

// Re-export commonly used types
pub use downloader::{DownloadConfig, GithubDownloader, RunSummary};
pub use location::GithubLocation;

/// A directory or file discovered while walking a repository tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Relative path: the bare name from a listing, or the name joined onto
    /// every ancestor once queued
    pub name: String,
    /// Directory or file
    pub kind: EntryKind,
    /// GitHub web URL of the entry (`html_url`)
    pub source_url: String,
}

impl Entry {
    /// Entry for a file
    pub fn file(name: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
            source_url: source_url.into(),
        }
    }

    /// Entry for a directory
    pub fn directory(name: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
            source_url: source_url.into(),
        }
    }
}

/// One file to fetch and where to put it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DownloadTask {
    /// GitHub web URL of the file (`/blob/` form)
    pub source_url: String,
    /// Path under the output directory; empty for single-file targets
    pub relative_path: String,
}
