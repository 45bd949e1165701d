//! Shared HTTP client with sensible defaults.

use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Thin wrapper around a pooled reqwest client
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    /// Create a client with the crate's user agent and a fixed per-request
    /// timeout
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// The underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }
}
