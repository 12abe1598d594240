// ABOUTME: Feed parsing library for exhtml.
// ABOUTME: Maps RSS/Atom/JSON feeds into ordered items exposing guid and link.

pub mod error;
pub mod models;
pub mod parser;

pub use error::FeedError;
pub use models::{Author, Feed, FeedItem};
pub use parser::{parse_feed_bytes, parse_feed_reader};

impl Feed {
    /// Returns every item's unique identifier, in feed order.
    ///
    /// An RSS item without a `<guid>` still gets a value: the parser derives a
    /// stable hash from the item's link and title, so the list never holds
    /// empty strings.
    pub fn guids(&self) -> Vec<String> {
        self.items.iter().map(|item| item.guid.clone()).collect()
    }

    /// Returns every item's link, in feed order.
    pub fn links(&self) -> Vec<String> {
        self.items.iter().map(|item| item.url.clone()).collect()
    }
}
