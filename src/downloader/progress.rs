//! Per-file progress reporting.
//!
//! The engine only talks to the narrow [`ProgressSink`] trait. A
//! [`ProgressReporter`] hands out one sink per dispatched file; the indicatif
//! renderer is one implementation, [`NoProgress`] another.
//!
//! Workers never hold a raw sink. They hold a [`TaskProgress`] guard which
//! tracks transferred bytes and guarantees exactly one terminal event: if the
//! guard is dropped without `complete`, it reports `abort`.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::io::{self, Write};

/// Receiver of byte counts and terminal state for one file.
pub trait ProgressSink: Send {
    /// Declared size, `None` while unknown.
    fn set_total(&mut self, total: Option<u64>);

    /// `delta` more bytes were transferred.
    fn on_bytes(&mut self, delta: u64);

    /// Transfer finished with `total` bytes written.
    fn complete(&mut self, total: u64);

    /// Transfer failed.
    fn abort(&mut self);
}

/// Factory for per-task sinks.
pub trait ProgressReporter: Send + Sync {
    /// Create the sink for a file labelled `label`. The total starts unknown.
    fn start_task(&self, label: &str) -> Box<dyn ProgressSink>;
}

/// Reporter that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn set_total(&mut self, _total: Option<u64>) {}
    fn on_bytes(&mut self, _delta: u64) {}
    fn complete(&mut self, _total: u64) {}
    fn abort(&mut self) {}
}

impl ProgressReporter for NoProgress {
    fn start_task(&self, _label: &str) -> Box<dyn ProgressSink> {
        Box::new(NoProgress)
    }
}

/// Terminal-bar reporter backed by an indicatif [`MultiProgress`].
#[derive(Clone)]
pub struct IndicatifReporter {
    multi: MultiProgress,
}

impl IndicatifReporter {
    /// Create a reporter drawing to stderr.
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
        }
    }
}

impl IndicatifReporter {
    /// Stderr writer that hides the bars while a log line is written
    pub fn log_writer(&self) -> BarSafeWriter {
        BarSafeWriter {
            multi: self.multi.clone(),
        }
    }
}

/// Stderr writer coordinated with a [`MultiProgress`]
///
/// Each write suspends the bars, so log lines land above them instead of being
/// drawn over.
#[derive(Clone)]
pub struct BarSafeWriter {
    multi: MultiProgress,
}

impl Write for BarSafeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.multi.suspend(|| io::stderr().write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.multi.suspend(|| io::stderr().flush())
    }
}

impl Default for IndicatifReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for IndicatifReporter {
    fn start_task(&self, label: &str) -> Box<dyn ProgressSink> {
        let bar = self.multi.add(ProgressBar::no_length());
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{prefix} [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
                .expect("hardcoded template is valid")
                .progress_chars("#>-"),
        );
        bar.set_prefix(label.to_string());
        Box::new(IndicatifSink { bar })
    }
}

struct IndicatifSink {
    bar: ProgressBar,
}

impl ProgressSink for IndicatifSink {
    fn set_total(&mut self, total: Option<u64>) {
        if let Some(total) = total {
            self.bar.set_length(total);
        }
    }

    fn on_bytes(&mut self, delta: u64) {
        self.bar.inc(delta);
    }

    fn complete(&mut self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(total);
        self.bar.finish_with_message("done!");
    }

    fn abort(&mut self) {
        self.bar.abandon_with_message("error!");
    }
}

/// Exclusively owned progress handle for one download.
pub struct TaskProgress {
    sink: Box<dyn ProgressSink>,
    transferred: u64,
    finished: bool,
}

impl TaskProgress {
    /// Wrap a freshly started sink.
    pub fn new(sink: Box<dyn ProgressSink>) -> Self {
        Self {
            sink,
            transferred: 0,
            finished: false,
        }
    }

    /// Declare the expected size.
    pub fn set_total(&mut self, total: u64) {
        self.sink.set_total(Some(total));
    }

    /// Record `delta` transferred bytes.
    pub fn advance(&mut self, delta: u64) {
        self.transferred = self.transferred.saturating_add(delta);
        self.sink.on_bytes(delta);
    }

    /// Bytes reported so far.
    pub fn transferred(&self) -> u64 {
        self.transferred
    }

    /// Finish successfully with `total` bytes.
    pub fn complete(mut self, total: u64) {
        self.finished = true;
        self.sink.complete(total);
    }

    /// Finish as failed.
    pub fn abort(mut self) {
        self.finished = true;
        self.sink.abort();
    }
}

impl Drop for TaskProgress {
    fn drop(&mut self) {
        if !self.finished {
            self.sink.abort();
        }
    }
}
