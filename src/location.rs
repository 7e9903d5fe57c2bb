//! GitHub web URL parsing and raw-content rewriting
//!
//! Implements the accepted URL shape:
//! `https://github.com/{owner}/{repo}/(tree|blob)/{ref}/{path}`

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use url::Url;

const GITHUB_HOST: &str = "github.com";
const RAW_CONTENT_HOST: &str = "raw.githubusercontent.com";
const BLOB_MARKER: &str = "/blob/";

static GITHUB_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://github\.com/([^/]+)/([^/]+)/(tree|blob)/[^/]+/(.+)")
        .expect("hardcoded pattern is valid")
});

/// Whether a GitHub path refers to a directory or a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// `tree` URLs and `"dir"` API items
    Directory,
    /// `blob` URLs and every other API item type
    File,
}

impl EntryKind {
    /// Lowercase label used in logs and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::File => "file",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured identity of a GitHub web URL
///
/// # Examples
///
/// ```
/// use github_tree_downloader::location::{GithubLocation, EntryKind};
///
/// let loc = GithubLocation::classify("https://github.com/acme/widgets/tree/main/docs/img").unwrap();
/// assert_eq!(loc.owner(), "acme");
/// assert_eq!(loc.repo(), "widgets");
/// assert_eq!(loc.path(), "docs/img");
/// assert_eq!(loc.kind(), EntryKind::Directory);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GithubLocation {
    owner: String,
    repo: String,
    path: String,
    kind: EntryKind,
}

impl GithubLocation {
    /// Parse a GitHub web URL into owner, repo, path and kind
    ///
    /// The `{ref}` segment must be present but is not kept.
    ///
    /// # Errors
    ///
    /// Returns [`UrlError::InvalidUrl`] for any URL not matching the
    /// `owner/repo/(tree|blob)/ref/path` shape.
    pub fn classify(url: &str) -> Result<Self, UrlError> {
        let caps = GITHUB_URL_RE
            .captures(url.trim())
            .ok_or_else(|| UrlError::InvalidUrl(format!("unsupported GitHub URL format: {url}")))?;

        let kind = match &caps[3] {
            "tree" => EntryKind::Directory,
            _ => EntryKind::File,
        };

        Ok(Self {
            owner: caps[1].to_string(),
            repo: caps[2].to_string(),
            path: caps[4].to_string(),
            kind,
        })
    }

    /// Repository owner (user or organisation)
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Repository name
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Path inside the repository, without leading slash
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Directory or file
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Contents API endpoint for this location under `api_base`
    pub fn contents_api_url(&self, api_base: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            api_base.trim_end_matches('/'),
            self.owner,
            self.repo,
            self.path
        )
    }
}

impl fmt::Display for GithubLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{} ({})", self.owner, self.repo, self.path, self.kind)
    }
}

/// Rewrite a GitHub file URL into its raw-content URL
///
/// Only the first `github.com` and the first `/blob/` are rewritten. `/tree/`
/// URLs are not handled, so only call this for files.
///
/// ```
/// use github_tree_downloader::location::to_raw_content_url;
///
/// let raw = to_raw_content_url("https://github.com/o/r/blob/main/a/b.txt").unwrap();
/// assert_eq!(raw, "https://raw.githubusercontent.com/o/r/main/a/b.txt");
/// ```
pub fn to_raw_content_url(url: &str) -> Result<String, UrlError> {
    if !url.contains(GITHUB_HOST) {
        return Err(UrlError::InvalidUrl(format!("not a GitHub URL: {url}")));
    }

    let rewritten = url
        .replacen(GITHUB_HOST, RAW_CONTENT_HOST, 1)
        .replacen(BLOB_MARKER, "/", 1);

    Url::parse(&rewritten)
        .map_err(|e| UrlError::InvalidUrl(format!("failed to parse {rewritten}: {e}")))?;

    Ok(rewritten)
}

/// Move a raw-content URL onto another base, keeping its path
///
/// Identity when `base` is the raw-content host itself.
pub fn rebase_url(raw_url: &str, base: &str) -> Result<String, UrlError> {
    let parsed = Url::parse(raw_url)
        .map_err(|e| UrlError::InvalidUrl(format!("failed to parse {raw_url}: {e}")))?;
    let rebased = format!("{}{}", base.trim_end_matches('/'), parsed.path());
    Url::parse(&rebased)
        .map_err(|e| UrlError::InvalidUrl(format!("failed to parse {rebased}: {e}")))?;
    Ok(rebased)
}

/// Last non-empty path segment of a URL (`"docs"` for `.../tree/main/docs/`)
pub fn last_segment(url: &str) -> &str {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    without_query
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
}

/// Errors raised while interpreting GitHub URLs
#[derive(Debug, thiserror::Error)]
pub enum UrlError {
    /// Malformed or non-GitHub URL
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}
