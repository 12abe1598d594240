// ABOUTME: Error types for feed parsing operations.
// ABOUTME: Provides the FeedError enum wrapping feed-rs failures.

use std::fmt;
use thiserror::Error;

/// Errors that can occur during feed parsing.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Failed to parse the feed data (malformed XML/JSON or unknown format).
    #[error("failed to parse feed: {0}")]
    Parse(String),

    /// Reading the feed body failed before parsing started.
    #[error("failed to read feed: {0}")]
    Read(String),
}

impl FeedError {
    /// Creates a Parse error from an underlying feed-rs error.
    pub fn parse(err: impl fmt::Display) -> Self {
        FeedError::Parse(err.to_string())
    }

    /// Creates a Read error from an I/O failure.
    pub fn read(err: impl fmt::Display) -> Self {
        FeedError::Read(err.to_string())
    }
}
