// ABOUTME: Configuration options for the fetch client and the ClientBuilder fluent API.
// ABOUTME: Defaults reproduce a fixed desktop browser identity, a 10s attempt timeout and 1s back-off base.

use std::collections::HashMap;
use std::time::Duration;

use crate::client::Client;
use crate::error::FetchError;

/// Desktop Chrome identity sent with every request unless overridden.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/94.0.4606.61 Safari/537.36";

/// Configuration options for the exhtml client.
#[derive(Debug, Clone)]
pub struct Options {
    /// Upper bound on one request, independent of any retry budget.
    pub attempt_timeout: Duration,
    pub user_agent: String,
    /// First back-off sleep; each later retry doubles it.
    pub backoff_base: Duration,
    pub headers: HashMap<String, String>,
    /// Pre-built client; when set, `attempt_timeout` and `user_agent` are not applied to it.
    pub http_client: Option<reqwest::blocking::Client>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            attempt_timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            backoff_base: Duration::from_secs(1),
            headers: HashMap::new(),
            http_client: None,
        }
    }
}

/// Builder for constructing Client instances with custom configuration.
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    opts: Options,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-attempt request timeout.
    pub fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.opts.attempt_timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    /// Set the first retry back-off delay.
    pub fn backoff_base(mut self, base: Duration) -> Self {
        self.opts.backoff_base = base;
        self
    }

    /// Add a custom header to all requests.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.insert(key.into(), value.into());
        self
    }

    /// Use a custom HTTP client.
    pub fn http_client(mut self, client: reqwest::blocking::Client) -> Self {
        self.opts.http_client = Some(client);
        self
    }

    /// Build the Client with the configured options.
    pub fn build(self) -> Result<Client, FetchError> {
        Client::new(self.opts)
    }
}
