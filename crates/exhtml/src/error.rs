// ABOUTME: Error types for exhtml including the ErrorCode enum and FetchError struct.
// ABOUTME: Provides categorized fetch errors with convenience constructors and boolean helpers.

use std::fmt;

/// Error codes representing different categories of fetch failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidUrl,
    Client,
    Fetch,
    Timeout,
    Read,
    Status,
    Feed,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::InvalidUrl => "invalid URL",
            ErrorCode::Client => "client error",
            ErrorCode::Fetch => "fetch error",
            ErrorCode::Timeout => "deadline exceeded",
            ErrorCode::Read => "body read error",
            ErrorCode::Status => "unexpected status",
            ErrorCode::Feed => "feed error",
        };
        write!(f, "{}", s)
    }
}

/// The main error type for fetch operations.
#[derive(Debug, thiserror::Error)]
pub struct FetchError {
    pub code: ErrorCode,
    pub url: String,
    pub op: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exhtml: {} {}: {}", self.op, self.url, self.code)?;
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl FetchError {
    fn new(
        code: ErrorCode,
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code,
            url: url.into(),
            op: op.into(),
            source,
        }
    }

    /// Create an InvalidUrl error.
    pub fn invalid_url(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::InvalidUrl, url, op, source)
    }

    /// Create a Client error (HTTP client could not be constructed).
    pub fn client(op: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self::new(ErrorCode::Client, String::new(), op, source)
    }

    /// Create a Fetch error (transport failure on a single request).
    pub fn fetch(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Fetch, url, op, source)
    }

    /// Create a Timeout error (retry budget exhausted).
    pub fn timeout(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Timeout, url, op, source)
    }

    /// Create a Read error (body read failed after connecting).
    pub fn read(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Read, url, op, source)
    }

    /// Create a Status error.
    pub fn status(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Status, url, op, source)
    }

    /// Create a Feed error.
    pub fn feed(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Feed, url, op, source)
    }

    /// Returns true if this is a Timeout error.
    pub fn is_timeout(&self) -> bool {
        self.code == ErrorCode::Timeout
    }

    /// Returns true if this is a Fetch error.
    pub fn is_fetch(&self) -> bool {
        self.code == ErrorCode::Fetch
    }

    /// Returns true if this is a Read error.
    pub fn is_read(&self) -> bool {
        self.code == ErrorCode::Read
    }

    /// Returns true if this is a Status error.
    pub fn is_status(&self) -> bool {
        self.code == ErrorCode::Status
    }

    /// Returns true if this is a Feed error.
    pub fn is_feed(&self) -> bool {
        self.code == ErrorCode::Feed
    }

    /// Returns true if this is an InvalidUrl error.
    pub fn is_invalid_url(&self) -> bool {
        self.code == ErrorCode::InvalidUrl
    }
}
