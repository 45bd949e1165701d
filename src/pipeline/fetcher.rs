//! Retrying fetcher: issues one outbound request, classifies the response,
//! and retries transient failures up to a fixed cap.
//!
//! The upstream service is flaky under load and returns missing fields or
//! empty bodies even on HTTP 200, so classification looks at content-level
//! sentinels as well as transport and status failures.

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::RetryConfig;
use crate::entrez::EntrezError;
use crate::utils::HttpClient;

/// A successfully fetched body paired with its originating URL. The URL
/// feeds error reports and the singleton page short-circuit, which
/// re-requests it verbatim.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub body: String,
}

/// Classification of one attempt. The retry loop is a plain state machine
/// over this type.
#[derive(Debug)]
enum Outcome {
    Success(String),
    Retryable(String),
    Fatal(String),
}

/// Error sentinel recognized inside an otherwise well-formed body.
fn sentinel_error(body: &str) -> Option<String> {
    if body.contains("Unable to obtain query") {
        return Some("upstream 'Unable to obtain query' sentinel".to_string());
    }

    if body.trim_start().starts_with('{') {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
            if value.get("error").is_some_and(|e| !e.is_null()) {
                return Some(format!("upstream error field: {}", value["error"]));
            }
            if let Some(err) = value
                .get("esearchresult")
                .and_then(|r| r.get("ERROR"))
                .filter(|e| !e.is_null())
            {
                return Some(format!("upstream search error: {}", err));
            }
        }
    }

    None
}

/// Issues requests with a fixed timeout and a capped linear retry loop.
#[derive(Debug, Clone)]
pub struct Fetcher {
    http: HttpClient,
    retry: RetryConfig,
}

impl Fetcher {
    pub fn new(http: HttpClient, retry: RetryConfig) -> Self {
        Self { http, retry }
    }

    /// The underlying HTTP client, for callers that stream response
    /// bodies instead of buffering them
    pub(crate) fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Fetch a URL, retrying transient failures. Exhausting the attempt
    /// cap escalates to a fatal error naming the URL and attempt count.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, EntrezError> {
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;

            match self.attempt(url).await {
                Outcome::Success(body) => {
                    if attempts > 1 {
                        debug!(url, attempts, "request succeeded after retries");
                    }
                    return Ok(FetchedPage {
                        url: url.to_string(),
                        body,
                    });
                }
                Outcome::Fatal(reason) => {
                    return Err(EntrezError::Network(format!("{} ({})", reason, url)));
                }
                Outcome::Retryable(reason) => {
                    warn!(url, attempt = attempts, reason, "transient upstream failure");

                    if attempts >= self.retry.max_attempts.max(1) {
                        return Err(EntrezError::RetriesExhausted {
                            url: url.to_string(),
                            attempts,
                        });
                    }
                    if self.retry.delay_ms > 0 {
                        sleep(Duration::from_millis(self.retry.delay_ms)).await;
                    }
                }
            }
        }
    }

    /// One attempt: request, then classify the response.
    async fn attempt(&self, url: &str) -> Outcome {
        let response = match self.http.client().get(url).send().await {
            Ok(response) => response,
            // An unbuildable request (bad URL) can never succeed on retry
            Err(err) if err.is_builder() => {
                return Outcome::Fatal(format!("invalid request: {}", err))
            }
            Err(err) => return Outcome::Retryable(format!("transport error: {}", err)),
        };

        let status = response.status();
        if !status.is_success() {
            return Outcome::Retryable(format!("HTTP {}", status));
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => return Outcome::Retryable(format!("body read error: {}", err)),
        };

        if body.trim().is_empty() {
            return Outcome::Retryable("empty response body".to_string());
        }

        if let Some(reason) = sentinel_error(&body) {
            return Outcome::Retryable(reason);
        }

        Outcome::Success(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_query_string() {
        let reason = sentinel_error("<ERROR>Unable to obtain query #1</ERROR>");
        assert!(reason.unwrap().contains("Unable to obtain query"));
    }

    #[test]
    fn test_sentinel_json_error_field() {
        assert!(sentinel_error(r#"{"error": "API rate limit exceeded"}"#).is_some());
        assert!(sentinel_error(r#"{"esearchresult": {"ERROR": "Empty term"}}"#).is_some());
    }

    #[test]
    fn test_clean_bodies_pass() {
        assert!(sentinel_error(r#"{"result": {"uids": []}}"#).is_none());
        assert!(sentinel_error("<eLinkResult></eLinkResult>").is_none());
        // A null error field is the upstream's way of saying "no error"
        assert!(sentinel_error(r#"{"error": null, "result": {}}"#).is_none());
    }
}
