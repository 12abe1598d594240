// ABOUTME: Rust models for parsed feed data.
// ABOUTME: Keeps the fields callers need to enumerate items (guid, link) plus basic metadata.

use serde::{Deserialize, Serialize};

/// Represents an author with optional name, email, and URI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub name: Option<String>,
    pub email: Option<String>,
    pub uri: Option<String>,
}

/// Represents a single item/entry within a feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: String,
    pub url: String,
    pub guid: String,
    pub summary: String,
    pub published_ms: u64,
    pub updated_ms: u64,
    pub author: Option<Author>,
    pub categories: Vec<String>,
}

/// Represents a parsed feed with metadata and items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    pub title: String,
    pub home_url: String,
    pub feed_url: String,
    pub description: String,
    pub language: Option<String>,
    pub updated_ms: u64,
    pub items: Vec<FeedItem>,
}
