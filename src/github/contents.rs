//! GitHub contents API client
//!
//! Lists one directory per call via
//! `GET {api_base}/repos/{owner}/{repo}/contents/{path}`.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use super::{DirectoryLister, ListError, ListResult};
use crate::location::{EntryKind, GithubLocation};
use crate::Entry;

/// Default GitHub REST API base
pub const GITHUB_API_BASE_URL: &str = "https://api.github.com";

/// One item of a contents API directory response
#[derive(Debug, Deserialize)]
struct ContentsItem {
    name: String,
    #[serde(rename = "type")]
    item_type: String,
    html_url: Option<String>,
}

impl From<ContentsItem> for Entry {
    fn from(item: ContentsItem) -> Self {
        let kind = if item.item_type == "dir" {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        Entry {
            name: item.name,
            kind,
            source_url: item.html_url.unwrap_or_default(),
        }
    }
}

/// Contents API client
#[derive(Debug, Clone)]
pub struct GithubContentsClient {
    client: Client,
    api_base_url: String,
}

impl GithubContentsClient {
    /// Create a client against `api_base_url` (e.g. "<https://api.github.com>")
    pub fn new(client: Client, api_base_url: impl Into<String>) -> Self {
        Self {
            client,
            api_base_url: api_base_url.into(),
        }
    }

    /// API base this client queries
    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }
}

#[async_trait]
impl DirectoryLister for GithubContentsClient {
    async fn list_contents(&self, dir_url: &str) -> ListResult<Vec<Entry>> {
        let location = GithubLocation::classify(dir_url)?;
        if location.kind() != EntryKind::Directory {
            return Err(ListError::NotADirectory(dir_url.to_string()));
        }

        let api_url = location.contents_api_url(&self.api_base_url);
        debug!("Listing {} via {}", location, api_url);

        let response = self
            .client
            .get(&api_url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| ListError::ApiRequestFailed(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ListError::ApiBadStatus {
                status: status.to_string(),
                url: api_url,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ListError::ApiRequestFailed(format!("failed to read response body: {e}")))?;

        let items: Vec<ContentsItem> =
            serde_json::from_slice(&body).map_err(|e| ListError::ApiBadPayload(e.to_string()))?;

        debug!("{} returned {} entries", api_url, items.len());
        Ok(items.into_iter().map(Entry::from).collect())
    }
}
