//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler:
//! - Building the HTTP client with the configured user agent and timeout
//! - Single GET requests, with redirects reported instead of followed
//! - Error classification into [`FetchError`]

use crate::config::HttpConfig;
use crate::FetchError;
use reqwest::{header, redirect::Policy, Client, StatusCode};
use std::time::Duration;

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The requested URL
    pub url: String,

    /// Raw response body
    pub body: Vec<u8>,
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are never followed: a redirect target could leave the domain
/// or hide which URL is canonical, so it is reported as a failure instead.
///
/// # Example
///
/// ```
/// use sitemapper::config::HttpConfig;
/// use sitemapper::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.request_timeout_secs.min(10)))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL with a single GET request
///
/// | Condition | Result |
/// |-----------|--------|
/// | HTTP 200 | `Ok(FetchedPage)` |
/// | HTTP 3xx | `FetchError::Redirect` |
/// | Any other status | `FetchError::Status` |
/// | Connection/timeout/TLS failure | `FetchError::Transport` |
/// | Body read failure | `FetchError::Body` |
///
/// No retries are attempted; a failed page is picked up again by the
/// next crawl cycle.
pub async fn fetch_page(client: &Client, url: &str) -> Result<FetchedPage, FetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();

    if status.is_redirection() {
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        return Err(FetchError::Redirect {
            url: url.to_string(),
            status: status.as_u16(),
            location,
        });
    }

    if status != StatusCode::OK {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })?;

    Ok(FetchedPage {
        url: url.to_string(),
        body: body.to_vec(),
    })
}
