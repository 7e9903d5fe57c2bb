//! Main entry point for github-tree-downloader CLI

use clap::Parser;
use github_tree_downloader::cli::Cli;
use github_tree_downloader::downloader::IndicatifReporter;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber with optional JSON formatting
///
/// With progress bars active, log lines are written through the bars'
/// writer so they are not drawn over.
fn init_tracing(bars: Option<&IndicatifReporter>) {
    // Check if JSON output is requested via environment variable
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("github_tree_downloader=info"));

    match (bars, json_format) {
        (Some(bars), true) => {
            let writer = bars.log_writer();
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(move || writer.clone())
                .init();
        }
        (Some(bars), false) => {
            let writer = bars.log_writer();
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(move || writer.clone())
                .init();
        }
        (None, true) => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        (None, false) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let bars = cli.progress_bars();
    init_tracing(bars.as_ref());

    let result = cli
        .execute(bars)
        .await
        .map(|_| ())
        .map_err(|e| anyhow::anyhow!(e).context(format!("downloading {}", cli.url)));

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }
}
