//! Bounded admission of download workers
//!
//! A counting semaphore holds `capacity` slots. Each dispatched job acquires an
//! owned permit before it is spawned and carries it for its whole lifetime, so
//! the slot is released on every exit path (success, error or panic) when the
//! job's future is dropped. Finished jobs are reaped into the running
//! [`RunSummary`] on every dispatch, so only live jobs are retained.

use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::error;

use super::worker::DownloadedFile;
use super::DownloadError;

/// Aggregate result of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Jobs admitted
    pub files_dispatched: u64,
    /// Jobs that wrote their file completely
    pub files_completed: u64,
    /// Jobs that aborted
    pub files_failed: u64,
    /// Bytes written by completed jobs
    pub bytes_written: u64,
}

impl RunSummary {
    fn record(&mut self, outcome: &Result<DownloadedFile, DownloadError>) {
        match outcome {
            Ok(file) => {
                self.files_completed += 1;
                self.bytes_written = self.bytes_written.saturating_add(file.bytes);
            }
            Err(_) => self.files_failed += 1,
        }
    }
}

/// Concurrency coordinator for download jobs
#[derive(Debug)]
pub struct Coordinator {
    slots: Arc<Semaphore>,
    capacity: usize,
    workers: JoinSet<Result<DownloadedFile, DownloadError>>,
    summary: RunSummary,
}

impl Coordinator {
    /// Create a coordinator with `capacity` slots (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Arc::new(Semaphore::new(capacity)),
            capacity,
            workers: JoinSet::new(),
            summary: RunSummary::default(),
        }
    }

    /// Slot pool size
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently held by running jobs
    pub fn in_flight(&self) -> usize {
        self.capacity - self.slots.available_permits()
    }

    /// Jobs admitted so far
    pub fn dispatched(&self) -> u64 {
        self.summary.files_dispatched
    }

    /// Jobs still running, after folding finished ones into the summary
    pub fn outstanding(&mut self) -> usize {
        self.reap_finished();
        self.workers.len()
    }

    /// Wait for a free slot, then spawn `job` holding it
    ///
    /// Blocks the caller while all slots are taken. Waiters are admitted in
    /// FIFO order.
    pub async fn dispatch<F>(&mut self, job: F)
    where
        F: Future<Output = Result<DownloadedFile, DownloadError>> + Send + 'static,
    {
        self.reap_finished();

        // The semaphore is private to the coordinator and never closed.
        let permit = self
            .slots
            .clone()
            .acquire_owned()
            .await
            .expect("download slots are never closed");
        self.summary.files_dispatched += 1;
        self.workers.spawn(async move {
            let _slot = permit;
            job.await
        });
    }

    /// Wait for every spawned job to terminate and return the totals
    pub async fn wait_all(mut self) -> RunSummary {
        while let Some(joined) = self.workers.join_next().await {
            self.record_joined(joined);
        }
        self.summary
    }

    fn reap_finished(&mut self) {
        while let Some(joined) = self.workers.try_join_next() {
            self.record_joined(joined);
        }
    }

    fn record_joined(&mut self, joined: Result<Result<DownloadedFile, DownloadError>, JoinError>) {
        match joined {
            Ok(outcome) => self.summary.record(&outcome),
            Err(e) => {
                error!("Download task failed to complete: {}", e);
                self.summary.files_failed += 1;
            }
        }
    }
}
