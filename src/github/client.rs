//! Shared HTTP client construction
//!
//! One `reqwest::Client` is built per run and cloned into the lister and every
//! download worker, so connection pooling is shared across concurrent transfers.

use reqwest::Client;

/// Build the HTTP client used for both the contents API and raw downloads
///
/// No request timeout is configured; transfers rely on the client defaults.
/// The GitHub API rejects requests without a `User-Agent`, so one is always set.
pub fn build_http_client(user_agent: &str) -> reqwest::Result<Client> {
    Client::builder().user_agent(user_agent).build()
}
