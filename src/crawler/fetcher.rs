//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured user agent and timeout
//! - GET requests with redirects handled by the caller
//! - Body reads capped at the configured resource size
//! - Error classification

use crate::audit::{FailureKind, FetchFailure};
use crate::config::CrawlerConfig;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{redirect::Policy, Client, Response};
use std::time::Duration;
use url::Url;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchOutcome {
    /// 2xx response with its full body
    Fetched {
        status: u16,
        content_type: String,
        body: Vec<u8>,
    },

    /// 3xx response; `location` is absolute and fragment-free
    Redirect { status: u16, location: String },

    /// Response with a status the audit has to classify
    HttpStatus {
        status: u16,
        content_type: Option<String>,
    },

    /// No usable response
    Failed(FetchFailure),

    /// The request could not be made or its redirect could not be followed
    Rejected { message: String },
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are never followed by the client: every hop is reported to the audit
/// and queued like any other URL.
///
/// # Example
///
/// ```no_run
/// use spider_audit::config::CrawlerConfig;
/// use spider_audit::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_millis(config.timeout_ms))
        .redirect(Policy::none())
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL
///
/// # Outcomes
///
/// | Condition | Outcome |
/// |-----------|---------|
/// | 2xx, body within size limit | `Fetched` |
/// | 3xx with a usable `Location` | `Redirect` |
/// | 3xx without one | `Rejected` |
/// | any other status | `HttpStatus` |
/// | body larger than `max_resource_size` | `Failed` (`ResourceTooLarge`) |
/// | timeout, connection or body errors | `Failed` |
pub async fn fetch_url(client: &Client, url: &Url, max_resource_size: u64) -> FetchOutcome {
    let response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => return classify_request_error(&e, FailureKind::Transport),
    };

    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    if status.is_redirection() {
        return redirect_outcome(url, status.as_u16(), &response);
    }

    if !status.is_success() {
        return FetchOutcome::HttpStatus {
            status: status.as_u16(),
            content_type,
        };
    }

    match read_body(response, max_resource_size).await {
        Ok(body) => FetchOutcome::Fetched {
            status: status.as_u16(),
            content_type: content_type.unwrap_or_default(),
            body,
        },
        Err(failure) => FetchOutcome::Failed(failure.with_status(status.as_u16())),
    }
}

fn redirect_outcome(url: &Url, status: u16, response: &Response) -> FetchOutcome {
    let location = match response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
    {
        Some(location) => location,
        None => {
            return FetchOutcome::Rejected {
                message: format!("{} redirect without a Location header", status),
            }
        }
    };

    match url.join(location) {
        Ok(mut target) => {
            target.set_fragment(None);
            FetchOutcome::Redirect {
                status,
                location: target.to_string(),
            }
        }
        Err(e) => FetchOutcome::Rejected {
            message: format!("Invalid redirect location '{}': {}", location, e),
        },
    }
}

/// Reads the body chunk by chunk, giving up once it exceeds `limit` bytes
async fn read_body(mut response: Response, limit: u64) -> Result<Vec<u8>, FetchFailure> {
    let too_large = || {
        FetchFailure::new(
            FailureKind::ResourceTooLarge,
            format!("Resource exceeds {} bytes", limit),
        )
    };

    if response.content_length().is_some_and(|len| len > limit) {
        return Err(too_large());
    }

    let mut body = Vec::new();
    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                if (body.len() + chunk.len()) as u64 > limit {
                    return Err(too_large());
                }
                body.extend_from_slice(&chunk);
            }
            Ok(None) => return Ok(body),
            Err(e) => {
                return Err(match classify_request_error(&e, FailureKind::DataError) {
                    FetchOutcome::Failed(failure) => failure,
                    _ => FetchFailure::new(FailureKind::DataError, e.to_string()),
                })
            }
        }
    }
}

/// Maps a reqwest error to an outcome; `fallback` is used for unclassified errors
fn classify_request_error(e: &reqwest::Error, fallback: FailureKind) -> FetchOutcome {
    let kind = if e.is_timeout() {
        FailureKind::Timeout
    } else if e.is_connect() {
        FailureKind::Connection
    } else if e.is_decode() {
        FailureKind::Decode
    } else if e.is_body() {
        FailureKind::DataError
    } else if e.is_builder() || e.is_redirect() {
        return FetchOutcome::Rejected {
            message: e.to_string(),
        };
    } else {
        fallback
    };

    let failure = FetchFailure::new(kind, e.to_string());
    match e.status() {
        Some(status) => FetchOutcome::Failed(failure.with_status(status.as_u16())),
        None => FetchOutcome::Failed(failure),
    }
}
