//! GitHub contents API access

use crate::location::UrlError;
use crate::Entry;
use async_trait::async_trait;

pub mod client;
pub mod contents;

pub use client::build_http_client;
pub use contents::GithubContentsClient;

/// Directory listing errors
///
/// Any of these aborts the whole traversal.
#[derive(Debug, thiserror::Error)]
pub enum ListError {
    /// URL did not parse as a GitHub web URL
    #[error(transparent)]
    InvalidUrl(#[from] UrlError),

    /// URL parsed but points at a file (`/blob/`)
    #[error("not a directory (must contain '/tree/'): {0}")]
    NotADirectory(String),

    /// Transport-level failure talking to the API
    #[error("failed to make request to GitHub API: {0}")]
    ApiRequestFailed(String),

    /// API answered with anything but 200
    #[error("GitHub API returned a non-200 status: {status} ({url})")]
    ApiBadStatus {
        /// Status line, e.g. "404 Not Found"
        status: String,
        /// Endpoint that was queried
        url: String,
    },

    /// Body was not the expected JSON array
    #[error("failed to parse GitHub API response: {0}")]
    ApiBadPayload(String),
}

/// Result type for listing operations
pub type ListResult<T> = Result<T, ListError>;

/// Lists the immediate children of a GitHub directory URL
#[async_trait]
pub trait DirectoryLister: Send + Sync {
    /// Return the children of `dir_url` in the order the source reports them
    ///
    /// Child names are bare names; callers join them onto their own paths.
    async fn list_contents(&self, dir_url: &str) -> ListResult<Vec<Entry>>;
}
