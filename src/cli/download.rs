//! Download command implementation

use crate::downloader::config::{
    default_output_dir, DEFAULT_MAX_CONCURRENCY, MAX_CONCURRENCY, RAW_CONTENT_BASE_URL,
};
use crate::downloader::{
    DownloadConfig, EngineError, GithubDownloader, IndicatifReporter, NoProgress,
    ProgressReporter, RunSummary,
};
use crate::github::contents::GITHUB_API_BASE_URL;
use crate::location::GithubLocation;
use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use super::CliError;

/// Parse and validate concurrency value
fn parse_concurrency(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if value == 0 {
        return Err("concurrency must be at least 1".to_string());
    }
    if value > MAX_CONCURRENCY {
        return Err(format!(
            "concurrency {value} exceeds maximum of {MAX_CONCURRENCY}"
        ));
    }
    Ok(value)
}

/// GitHub Tree Downloader CLI
#[derive(Parser, Debug)]
#[command(name = "github-tree-downloader")]
#[command(about = "Download a file or directory from a GitHub repository", long_about = None)]
#[command(version)]
pub struct Cli {
    /// GitHub URL of a file (.../blob/{ref}/{path}) or directory (.../tree/{ref}/{path})
    #[arg(long)]
    pub url: String,

    /// Directory to save into (default: "download" beside the executable)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Number of concurrent file downloads (default: 5, max: 32)
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENCY, value_parser = parse_concurrency)]
    pub concurrency: usize,

    /// Summary format (json or human)
    #[arg(long, default_value = "human")]
    pub output_format: OutputFormat,

    /// Disable progress bars
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,

    /// Contents API base URL
    #[arg(long, hide = true, default_value = GITHUB_API_BASE_URL)]
    pub api_base_url: String,

    /// Raw-content base URL
    #[arg(long, hide = true, default_value = RAW_CONTENT_BASE_URL)]
    pub raw_base_url: String,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Human-readable output
    Human,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" => Ok(OutputFormat::Human),
            _ => Err(format!("Invalid output format: {s}")),
        }
    }
}

impl Cli {
    /// Build the run configuration from the parsed arguments
    pub fn to_config(&self) -> Result<DownloadConfig, CliError> {
        let output_dir = match &self.output {
            Some(dir) => dir.clone(),
            None => default_output_dir().map_err(|e| {
                CliError::ConfigurationError(format!("Error getting executable path: {e}"))
            })?,
        };

        Ok(DownloadConfig::new(output_dir)
            .with_max_concurrency(self.concurrency)
            .with_api_base_url(self.api_base_url.clone())
            .with_raw_base_url(self.raw_base_url.clone()))
    }

    /// Progress bars for this run, unless disabled with `--no-progress`
    pub fn progress_bars(&self) -> Option<IndicatifReporter> {
        (!self.no_progress).then(IndicatifReporter::new)
    }

    /// Execute the download and print a summary
    ///
    /// `bars` should be the reporter whose log writer the tracing subscriber
    /// uses, so log lines and bars share the terminal cleanly.
    pub async fn execute(&self, bars: Option<IndicatifReporter>) -> Result<RunSummary, CliError> {
        let config = self.to_config()?;
        let output_dir = config.output_dir().to_path_buf();

        let reporter: Arc<dyn ProgressReporter> = match bars {
            Some(bars) => Arc::new(bars),
            None => Arc::new(NoProgress),
        };
        let downloader = GithubDownloader::new(config)?.with_reporter(reporter);

        let result = downloader.run(&self.url).await;

        match self.output_format {
            OutputFormat::Json => println!("{}", render_json(&self.url, &output_dir, &result)),
            OutputFormat::Human => {
                if let Some(text) = render_human(&self.url, &output_dir, &result) {
                    println!("{text}");
                }
            }
        }

        result.map_err(CliError::EngineError)
    }
}

/// Render a run result as a single-line JSON object
pub fn render_json(
    url: &str,
    output_dir: &std::path::Path,
    result: &Result<RunSummary, EngineError>,
) -> String {
    let summary = result.as_ref().copied().unwrap_or_default();
    let kind = GithubLocation::classify(url)
        .ok()
        .map(|location| location.kind().as_str());

    let output = serde_json::json!({
        "success": result.is_ok(),
        "url": url,
        "kind": kind,
        "output_dir": output_dir.display().to_string(),
        "files_dispatched": summary.files_dispatched,
        "files_completed": summary.files_completed,
        "files_failed": summary.files_failed,
        "bytes_written": summary.bytes_written,
        "error": result.as_ref().err().map(|e| e.to_string()),
    });

    output.to_string()
}

/// Human-readable summary of a finished run
///
/// Fatal errors render nothing here; they are reported once by the binary's
/// error log.
pub fn render_human(
    url: &str,
    output_dir: &std::path::Path,
    result: &Result<RunSummary, EngineError>,
) -> Option<String> {
    let summary = result.as_ref().ok()?;

    let mut lines = vec![
        format!("\nDownload finished: {url}"),
        format!("Output: {}", output_dir.display()),
        format!(
            "Files downloaded: {}/{}",
            summary.files_completed, summary.files_dispatched
        ),
    ];
    if summary.files_failed > 0 {
        lines.push(format!("Files failed: {}", summary.files_failed));
    }
    lines.push(format!("Bytes written: {}", summary.bytes_written));
    Some(lines.join("\n"))
}
