// ABOUTME: Feed parsing implementation using feed-rs.
// ABOUTME: Maps feed-rs types to internal models, preserving item order.

use std::io::Read;

use chrono::Utc;
use feed_rs::model::{Entry, Feed as FeedRsFeed, Link, Person};
use feed_rs::parser::ParseFeedError;
use tracing::debug;

use crate::error::FeedError;
use crate::models::{Author, Feed, FeedItem};

/// Parses feed bytes into a Feed struct.
///
/// # Arguments
/// * `data` - Raw feed bytes (RSS, Atom, or JSON Feed)
/// * `feed_url` - The URL the feed was fetched from (stored as-is)
///
/// # Returns
/// * `Ok(Feed)` - Successfully parsed feed; items keep document order
/// * `Err(FeedError)` - The data is not a feed feed-rs understands
pub fn parse_feed_bytes(data: &[u8], feed_url: &str) -> Result<Feed, FeedError> {
    parse_feed_reader(data, feed_url)
}

/// Parses a feed from any reader, such as a streaming response body.
pub fn parse_feed_reader<R: Read>(reader: R, feed_url: &str) -> Result<Feed, FeedError> {
    let parsed = feed_rs::parser::parse(reader).map_err(|err| match err {
        ParseFeedError::IoError(io) => FeedError::read(io),
        other => FeedError::parse(other),
    })?;
    let feed = map_feed(parsed, feed_url);
    debug!(feed_url, items = feed.items.len(), "parsed feed");
    Ok(feed)
}

fn map_feed(parsed: FeedRsFeed, feed_url: &str) -> Feed {
    let items = parsed.entries.iter().map(map_entry).collect();

    Feed {
        title: parsed.title.map(|t| t.content).unwrap_or_default(),
        home_url: extract_home_url(&parsed.links),
        feed_url: feed_url.to_string(),
        description: parsed.description.map(|d| d.content).unwrap_or_default(),
        language: parsed.language,
        updated_ms: parsed
            .updated
            .or(parsed.published)
            .map(|dt| dt.timestamp_millis() as u64)
            .unwrap_or_else(|| Utc::now().timestamp_millis() as u64),
        items,
    }
}

/// Checks if a link is an enclosure link (rel == "enclosure").
fn is_enclosure_link(link: &Link) -> bool {
    link.rel.as_deref() == Some("enclosure")
}

/// Extracts the home URL from feed links.
/// Prefers link with rel="alternate", otherwise uses first link href.
fn extract_home_url(links: &[Link]) -> String {
    links
        .iter()
        .find(|link| link.rel.as_deref() == Some("alternate"))
        .or_else(|| links.first())
        .map(|l| l.href.clone())
        .unwrap_or_default()
}

/// Extracts the item URL from entry links.
/// Prefers link with rel="alternate", otherwise first non-enclosure link, then entry.id.
fn extract_item_url(entry: &Entry) -> String {
    for link in &entry.links {
        if link.rel.as_deref() == Some("alternate") {
            return link.href.clone();
        }
    }

    for link in &entry.links {
        if !is_enclosure_link(link) {
            return link.href.clone();
        }
    }

    entry.id.clone()
}

/// Maps a feed-rs Entry to our FeedItem model.
fn map_entry(entry: &Entry) -> FeedItem {
    let published_ms = entry
        .published
        .map(|dt| dt.timestamp_millis() as u64)
        .unwrap_or(0);

    let updated_ms = entry
        .updated
        .or(entry.published)
        .map(|dt| dt.timestamp_millis() as u64)
        .unwrap_or(0);

    FeedItem {
        title: entry
            .title
            .as_ref()
            .map(|t| t.content.clone())
            .unwrap_or_default(),
        url: extract_item_url(entry),
        guid: entry.id.clone(),
        summary: entry
            .summary
            .as_ref()
            .map(|t| t.content.clone())
            .unwrap_or_default(),
        published_ms,
        updated_ms,
        author: entry.authors.first().map(person_to_author),
        categories: entry.categories.iter().map(|c| c.term.clone()).collect(),
    }
}

/// Converts a feed-rs Person to our Author model.
fn person_to_author(person: &Person) -> Author {
    Author {
        name: Some(person.name.clone()),
        email: person.email.clone(),
        uri: person.uri.clone(),
    }
}
