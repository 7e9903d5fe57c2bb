//! Download configuration
//!
//! A single [`DownloadConfig`] is built once per run and passed by reference
//! into the engine and every worker.

use std::path::{Path, PathBuf};

use crate::github::contents::GITHUB_API_BASE_URL;

/// Default number of simultaneous file downloads.
pub const DEFAULT_MAX_CONCURRENCY: usize = 5;

/// Upper bound accepted for the concurrency cap.
pub const MAX_CONCURRENCY: usize = 32;

/// Host serving raw file bytes.
pub const RAW_CONTENT_BASE_URL: &str = "https://raw.githubusercontent.com";

/// Name of the output directory created beside the executable by default.
pub const DEFAULT_OUTPUT_DIR_NAME: &str = "download";

/// User agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Run configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadConfig {
    output_dir: PathBuf,
    max_concurrency: usize,
    api_base_url: String,
    raw_base_url: String,
    user_agent: String,
}

impl DownloadConfig {
    /// Configuration writing into `output_dir` with default endpoints
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.into(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            api_base_url: GITHUB_API_BASE_URL.to_string(),
            raw_base_url: RAW_CONTENT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Set the concurrency cap (clamped to at least 1)
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Point directory listings at another API base
    pub fn with_api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self
    }

    /// Point file downloads at another raw-content base
    pub fn with_raw_base_url(mut self, raw_base_url: impl Into<String>) -> Self {
        self.raw_base_url = raw_base_url.into();
        self
    }

    /// Override the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Root directory all relative paths are resolved against
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Maximum number of workers holding a slot at once
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Contents API base
    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    /// Raw-content base
    pub fn raw_base_url(&self) -> &str {
        &self.raw_base_url
    }

    /// User agent header value
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Whether raw URLs must be re-rooted before fetching
    pub fn rebases_raw_urls(&self) -> bool {
        self.raw_base_url.trim_end_matches('/') != RAW_CONTENT_BASE_URL
    }
}

/// `download` directory beside the running executable
pub fn default_output_dir() -> std::io::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let dir = exe.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok(dir.join(DEFAULT_OUTPUT_DIR_NAME))
}
