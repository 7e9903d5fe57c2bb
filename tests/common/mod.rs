//! Shared test helpers

use async_trait::async_trait;
use github_tree_downloader::github::{DirectoryLister, ListError, ListResult};
use github_tree_downloader::Entry;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory directory lister keyed by directory URL
///
/// Directories registered with [`FakeLister::fail`] answer with a 500 status.
#[derive(Default)]
pub struct FakeLister {
    listings: HashMap<String, Option<Vec<Entry>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeLister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the children of `dir_url`
    pub fn dir(mut self, dir_url: &str, children: Vec<Entry>) -> Self {
        self.listings.insert(dir_url.to_string(), Some(children));
        self
    }

    /// Make listing `dir_url` fail
    pub fn fail(mut self, dir_url: &str) -> Self {
        self.listings.insert(dir_url.to_string(), None);
        self
    }

    /// Directory URLs listed so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DirectoryLister for FakeLister {
    async fn list_contents(&self, dir_url: &str) -> ListResult<Vec<Entry>> {
        self.calls.lock().unwrap().push(dir_url.to_string());
        match self.listings.get(dir_url) {
            Some(Some(children)) => Ok(children.clone()),
            Some(None) => Err(ListError::ApiBadStatus {
                status: "500 Internal Server Error".to_string(),
                url: dir_url.to_string(),
            }),
            None => Err(ListError::ApiBadStatus {
                status: "404 Not Found".to_string(),
                url: dir_url.to_string(),
            }),
        }
    }
}

/// GitHub web URL for a directory in acme/widgets@main
pub fn tree_url(path: &str) -> String {
    format!("https://github.com/acme/widgets/tree/main/{path}")
}

/// GitHub web URL for a file in acme/widgets@main
pub fn blob_url(path: &str) -> String {
    format!("https://github.com/acme/widgets/blob/main/{path}")
}

/// Listing entry for a subdirectory `name` of `parent`
pub fn dir_entry(parent: &str, name: &str) -> Entry {
    Entry::directory(name, tree_url(&format!("{parent}/{name}")))
}

/// Listing entry for a file `name` of `parent`
pub fn file_entry(parent: &str, name: &str) -> Entry {
    Entry::file(name, blob_url(&format!("{parent}/{name}")))
}
