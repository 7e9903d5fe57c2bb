//! Directory (`tree`) downloads against a local contents API and raw host

use crate::common::{dir_entry, file_entry, tree_url, FakeLister};
use github_tree_downloader::downloader::{
    DownloadConfig, EngineError, GithubDownloader, ProgressReporter, ProgressSink,
};
use github_tree_downloader::github::ListError;
use mockito::{Mock, ServerGuard};
use std::fs;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

fn listing(items: &[(&str, &str, &str)]) -> String {
    let items: Vec<_> = items
        .iter()
        .map(|(name, kind, html_url)| {
            serde_json::json!({ "name": name, "type": kind, "html_url": html_url })
        })
        .collect();
    serde_json::Value::Array(items).to_string()
}

async fn mock_listing(server: &mut ServerGuard, path: &str, body: String) -> Mock {
    server
        .mock("GET", format!("/repos/acme/widgets/contents/{path}").as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .expect(1)
        .create_async()
        .await
}

async fn mock_raw(server: &mut ServerGuard, path: &str, body: &str) -> Mock {
    server
        .mock("GET", format!("/acme/widgets/main/{path}").as_str())
        .with_status(200)
        .with_body(body)
        .create_async()
        .await
}

fn downloader_for(server: &ServerGuard, out: &TempDir) -> GithubDownloader {
    let config = DownloadConfig::new(out.path())
        .with_api_base_url(server.url())
        .with_raw_base_url(server.url());
    GithubDownloader::new(config).unwrap()
}

#[derive(Clone, Default)]
struct EventLog(Arc<Mutex<Vec<String>>>);

struct LoggedSink {
    label: String,
    log: EventLog,
}

impl ProgressSink for LoggedSink {
    fn set_total(&mut self, _total: Option<u64>) {}
    fn on_bytes(&mut self, _delta: u64) {}
    fn complete(&mut self, total: u64) {
        self.log
            .0
            .lock()
            .unwrap()
            .push(format!("{} complete {}", self.label, total));
    }
    fn abort(&mut self) {
        self.log.0.lock().unwrap().push(format!("{} abort", self.label));
    }
}

impl ProgressReporter for EventLog {
    fn start_task(&self, label: &str) -> Box<dyn ProgressSink> {
        Box::new(LoggedSink {
            label: label.to_string(),
            log: self.clone(),
        })
    }
}

/// Counts sinks that have started but not yet reached a terminal event
#[derive(Clone, Default)]
struct ActiveTransfers {
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

struct ActiveSink {
    counter: ActiveTransfers,
}

impl ActiveSink {
    fn finish(&mut self) {
        self.counter.active.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ProgressSink for ActiveSink {
    fn set_total(&mut self, _total: Option<u64>) {}
    fn on_bytes(&mut self, _delta: u64) {}
    fn complete(&mut self, _total: u64) {
        self.finish();
    }
    fn abort(&mut self) {
        self.finish();
    }
}

impl ProgressReporter for ActiveTransfers {
    fn start_task(&self, _label: &str) -> Box<dyn ProgressSink> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        Box::new(ActiveSink {
            counter: self.clone(),
        })
    }
}

#[tokio::test]
async fn test_docs_tree_mirrors_layout() {
    let mut server = mockito::Server::new_async().await;
    let docs = mock_listing(
        &mut server,
        "docs",
        listing(&[
            ("a.md", "file", "https://github.com/acme/widgets/blob/main/docs/a.md"),
            ("img", "dir", "https://github.com/acme/widgets/tree/main/docs/img"),
        ]),
    )
    .await;
    let img = mock_listing(
        &mut server,
        "docs/img",
        listing(&[(
            "logo.png",
            "file",
            "https://github.com/acme/widgets/blob/main/docs/img/logo.png",
        )]),
    )
    .await;
    let _a = mock_raw(&mut server, "docs/a.md", "# A\n").await;
    let _logo = mock_raw(&mut server, "docs/img/logo.png", "PNGDATA").await;

    let out = TempDir::new().unwrap();
    let events = EventLog::default();
    let downloader = downloader_for(&server, &out).with_reporter(Arc::new(events.clone()));

    let summary = downloader
        .run("https://github.com/acme/widgets/tree/main/docs")
        .await
        .unwrap();

    docs.assert_async().await;
    img.assert_async().await;
    assert_eq!(summary.files_dispatched, 2);
    assert_eq!(summary.files_completed, 2);
    assert_eq!(summary.files_failed, 0);
    assert_eq!(
        fs::read_to_string(out.path().join("docs/a.md")).unwrap(),
        "# A\n"
    );
    assert_eq!(
        fs::read(out.path().join("docs/img/logo.png")).unwrap(),
        b"PNGDATA"
    );

    let mut log = events.0.lock().unwrap().clone();
    log.sort();
    assert_eq!(
        log,
        vec!["docs/a.md complete 4", "docs/img/logo.png complete 7"]
    );
}

#[tokio::test]
async fn test_failed_file_does_not_stop_siblings() {
    let mut server = mockito::Server::new_async().await;
    let _docs = mock_listing(
        &mut server,
        "docs",
        listing(&[
            ("gone.md", "file", "https://github.com/acme/widgets/blob/main/docs/gone.md"),
            ("ok.md", "file", "https://github.com/acme/widgets/blob/main/docs/ok.md"),
        ]),
    )
    .await;
    let _gone = server
        .mock("GET", "/acme/widgets/main/docs/gone.md")
        .with_status(500)
        .create_async()
        .await;
    let _ok = mock_raw(&mut server, "docs/ok.md", "fine").await;

    let out = TempDir::new().unwrap();
    let events = EventLog::default();
    let downloader = downloader_for(&server, &out).with_reporter(Arc::new(events.clone()));

    let summary = downloader
        .run("https://github.com/acme/widgets/tree/main/docs")
        .await
        .unwrap();

    assert_eq!(summary.files_dispatched, 2);
    assert_eq!(summary.files_completed, 1);
    assert_eq!(summary.files_failed, 1);
    assert!(!out.path().join("docs/gone.md").exists());
    assert!(out.path().join("docs/ok.md").exists());

    let mut log = events.0.lock().unwrap().clone();
    log.sort();
    assert_eq!(log, vec!["docs/gone.md abort", "docs/ok.md complete 4"]);
}

#[tokio::test]
async fn test_listing_failure_is_fatal_and_halts_dispatch() {
    let mut server = mockito::Server::new_async().await;
    let _root = mock_listing(
        &mut server,
        "docs",
        listing(&[
            ("broken", "dir", "https://github.com/acme/widgets/tree/main/docs/broken"),
            ("late.md", "file", "https://github.com/acme/widgets/blob/main/docs/late.md"),
        ]),
    )
    .await;
    let _broken = server
        .mock("GET", "/repos/acme/widgets/contents/docs/broken")
        .with_status(403)
        .create_async()
        .await;
    let late = server
        .mock("GET", "/acme/widgets/main/docs/late.md")
        .with_status(200)
        .with_body("never")
        .expect(0)
        .create_async()
        .await;

    let out = TempDir::new().unwrap();
    let result = downloader_for(&server, &out)
        .run("https://github.com/acme/widgets/tree/main/docs")
        .await;

    match result {
        Err(EngineError::Listing(ListError::ApiBadStatus { status, .. })) => {
            assert!(status.starts_with("403"), "unexpected status {status}");
        }
        other => panic!("expected listing failure, got {other:?}"),
    }
    late.assert_async().await;
    assert!(!out.path().join("docs/late.md").exists());
}

#[tokio::test]
async fn test_malformed_listing_is_bad_payload() {
    let mut server = mockito::Server::new_async().await;
    let _docs = mock_listing(&mut server, "docs", "{\"message\": \"oops\"}".to_string()).await;

    let out = TempDir::new().unwrap();
    let result = downloader_for(&server, &out)
        .run("https://github.com/acme/widgets/tree/main/docs")
        .await;

    assert!(matches!(
        result,
        Err(EngineError::Listing(ListError::ApiBadPayload(_)))
    ));
}

#[tokio::test]
async fn test_body_without_length_is_buffered_and_written() {
    let mut server = mockito::Server::new_async().await;
    let _docs = mock_listing(
        &mut server,
        "docs",
        listing(&[(
            "stream.txt",
            "file",
            "https://github.com/acme/widgets/blob/main/docs/stream.txt",
        )]),
    )
    .await;
    let _stream = server
        .mock("GET", "/acme/widgets/main/docs/stream.txt")
        .with_status(200)
        .with_chunked_body(|w| w.write_all(b"chunked payload"))
        .create_async()
        .await;

    let out = TempDir::new().unwrap();
    let summary = downloader_for(&server, &out)
        .run("https://github.com/acme/widgets/tree/main/docs")
        .await
        .unwrap();

    assert_eq!(summary.files_completed, 1);
    assert_eq!(summary.bytes_written, 15);
    assert_eq!(
        fs::read_to_string(out.path().join("docs/stream.txt")).unwrap(),
        "chunked payload"
    );
}

#[tokio::test]
async fn test_many_files_respect_concurrency_cap() {
    let mut server = mockito::Server::new_async().await;
    let names: Vec<String> = (0..12).map(|i| format!("f{i}.txt")).collect();
    let urls: Vec<String> = names
        .iter()
        .map(|n| format!("https://github.com/acme/widgets/blob/main/bulk/{n}"))
        .collect();
    let items: Vec<(&str, &str, &str)> = names
        .iter()
        .zip(urls.iter())
        .map(|(n, u)| (n.as_str(), "file", u.as_str()))
        .collect();
    let _bulk = mock_listing(&mut server, "bulk", listing(&items)).await;

    let mut raws = Vec::new();
    for name in &names {
        let raw = server
            .mock("GET", format!("/acme/widgets/main/bulk/{name}").as_str())
            .with_status(200)
            .with_chunked_body(|w| {
                w.write_all(b"x")?;
                std::thread::sleep(Duration::from_millis(30));
                w.write_all(b"y")
            })
            .create_async()
            .await;
        raws.push(raw);
    }

    let out = TempDir::new().unwrap();
    let counter = ActiveTransfers::default();
    let config = DownloadConfig::new(out.path())
        .with_api_base_url(server.url())
        .with_raw_base_url(server.url())
        .with_max_concurrency(2);
    let summary = GithubDownloader::new(config)
        .unwrap()
        .with_reporter(Arc::new(counter.clone()))
        .run("https://github.com/acme/widgets/tree/main/bulk")
        .await
        .unwrap();

    assert_eq!(summary.files_dispatched, 12);
    assert_eq!(summary.files_completed, 12);
    let peak = counter.peak.load(Ordering::SeqCst);
    assert_eq!(peak, 2, "peak concurrency {peak}");
    assert_eq!(counter.active.load(Ordering::SeqCst), 0);
    for name in &names {
        assert!(out.path().join("bulk").join(name).exists());
    }
}

#[tokio::test]
async fn test_custom_lister_drives_raw_downloads() {
    let mut server = mockito::Server::new_async().await;
    let _top = mock_raw(&mut server, "pkg/top.txt", "top").await;
    let _deep = mock_raw(&mut server, "pkg/nested/deep.txt", "deep").await;

    let lister = FakeLister::new()
        .dir(
            &tree_url("pkg"),
            vec![dir_entry("pkg", "nested"), file_entry("pkg", "top.txt")],
        )
        .dir(&tree_url("pkg/nested"), vec![file_entry("pkg/nested", "deep.txt")]);

    let out = TempDir::new().unwrap();
    let config = DownloadConfig::new(out.path()).with_raw_base_url(server.url());
    let summary = GithubDownloader::new(config)
        .unwrap()
        .with_lister(lister)
        .run(&tree_url("pkg"))
        .await
        .unwrap();

    assert_eq!(summary.files_completed, 2);
    assert_eq!(fs::read_to_string(out.path().join("pkg/top.txt")).unwrap(), "top");
    assert_eq!(
        fs::read_to_string(out.path().join("pkg/nested/deep.txt")).unwrap(),
        "deep"
    );
}

#[tokio::test]
async fn test_listing_failure_waits_for_running_downloads() {
    let mut server = mockito::Server::new_async().await;
    let _root = mock_listing(
        &mut server,
        "docs",
        listing(&[
            ("slow.bin", "file", "https://github.com/acme/widgets/blob/main/docs/slow.bin"),
            ("broken", "dir", "https://github.com/acme/widgets/tree/main/docs/broken"),
        ]),
    )
    .await;
    let slow = server
        .mock("GET", "/acme/widgets/main/docs/slow.bin")
        .with_status(200)
        .with_chunked_body(|w| {
            std::thread::sleep(Duration::from_millis(300));
            w.write_all(b"slow")?;
            w.write_all(b"data")
        })
        .expect(1)
        .create_async()
        .await;
    let _broken = server
        .mock("GET", "/repos/acme/widgets/contents/docs/broken")
        .with_status(500)
        .create_async()
        .await;

    let out = TempDir::new().unwrap();
    let events = EventLog::default();
    let result = downloader_for(&server, &out)
        .with_reporter(Arc::new(events.clone()))
        .run("https://github.com/acme/widgets/tree/main/docs")
        .await;

    assert!(matches!(
        result,
        Err(EngineError::Listing(ListError::ApiBadStatus { .. }))
    ));
    slow.assert_async().await;
    assert_eq!(
        fs::read_to_string(out.path().join("docs/slow.bin")).unwrap(),
        "slowdata"
    );
    assert_eq!(
        events.0.lock().unwrap().clone(),
        vec!["docs/slow.bin complete 8"]
    );
}
