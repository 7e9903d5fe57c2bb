//! Breadth-first expansion of a GitHub directory tree
//!
//! The queue is seeded with the root directory and yields one
//! [`DownloadTask`] per file. Directories are listed one at a time in FIFO
//! order; each child's name is joined onto its parent's so that relative
//! output paths accumulate as the tree is walked.

use std::collections::VecDeque;
use tracing::debug;

use crate::github::{DirectoryLister, ListResult};
use crate::location::{last_segment, EntryKind};
use crate::{DownloadTask, Entry};

/// FIFO worklist of pending entries
#[derive(Debug, Default)]
pub struct TraversalQueue {
    queue: VecDeque<Entry>,
    directories_expanded: usize,
}

impl TraversalQueue {
    /// Seed the queue with the root directory at `root_url`
    ///
    /// The root's name is the last path segment of the URL, so every output path
    /// starts with the directory the user pointed at.
    pub fn new(root_url: &str) -> Self {
        let mut queue = VecDeque::new();
        queue.push_back(Entry {
            name: last_segment(root_url).to_string(),
            kind: EntryKind::Directory,
            source_url: root_url.to_string(),
        });
        Self {
            queue,
            directories_expanded: 0,
        }
    }

    /// Number of entries not yet removed
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether traversal is complete
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Directories listed so far
    pub fn directories_expanded(&self) -> usize {
        self.directories_expanded
    }

    /// Expand directories until the next file is found
    ///
    /// Returns `Ok(None)` once the queue is drained. A listing failure is
    /// returned immediately; the failing directory's children are never queued.
    pub async fn next_task<L>(&mut self, lister: &L) -> ListResult<Option<DownloadTask>>
    where
        L: DirectoryLister + ?Sized,
    {
        while let Some(entry) = self.queue.pop_front() {
            match entry.kind {
                EntryKind::Directory => self.expand(entry, lister).await?,
                EntryKind::File => {
                    return Ok(Some(DownloadTask {
                        source_url: entry.source_url,
                        relative_path: entry.name,
                    }))
                }
            }
        }
        Ok(None)
    }

    async fn expand<L>(&mut self, dir: Entry, lister: &L) -> ListResult<()>
    where
        L: DirectoryLister + ?Sized,
    {
        let children = lister.list_contents(&dir.source_url).await?;
        debug!("Expanded {} ({} children)", dir.name, children.len());
        self.directories_expanded += 1;

        for mut child in children {
            child.name = join_relative(&dir.name, &child.name);
            self.queue.push_back(child);
        }
        Ok(())
    }
}

/// Join two relative path components with `/`, skipping empty sides
pub fn join_relative(parent: &str, child: &str) -> String {
    match (parent.is_empty(), child.is_empty()) {
        (true, _) => child.to_string(),
        (_, true) => parent.to_string(),
        _ => format!("{}/{}", parent.trim_end_matches('/'), child),
    }
}
