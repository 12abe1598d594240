// ABOUTME: Integration tests for feed parsing functionality.
// ABOUTME: Tests item ordering, guid/link extraction for RSS and Atom, and error reporting.

use exhtml_feed::{parse_feed_bytes, parse_feed_reader, FeedError};
use pretty_assertions::assert_eq;

const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
    <channel>
        <title>News</title>
        <link>https://news.example.com</link>
        <description>Latest headlines</description>
        <item>
            <title>First</title>
            <link>https://news.example.com/a/1</link>
            <guid>news-1</guid>
            <pubDate>Mon, 15 Jan 2024 10:00:00 +0000</pubDate>
            <category>world</category>
        </item>
        <item>
            <title>Second</title>
            <link>https://news.example.com/a/2</link>
            <guid>news-2</guid>
        </item>
        <item>
            <title>Third</title>
            <link>https://news.example.com/a/3</link>
            <guid>news-3</guid>
        </item>
    </channel>
</rss>"#;

/// Items come back in document order with their guid and link.
#[test]
fn test_rss_guids_and_links_in_order() {
    let feed = parse_feed_bytes(RSS.as_bytes(), "https://news.example.com/rss").unwrap();

    assert_eq!(feed.title, "News");
    assert_eq!(feed.feed_url, "https://news.example.com/rss");
    assert_eq!(feed.guids(), vec!["news-1", "news-2", "news-3"]);
    assert_eq!(
        feed.links(),
        vec![
            "https://news.example.com/a/1",
            "https://news.example.com/a/2",
            "https://news.example.com/a/3",
        ]
    );
}

#[test]
fn test_rss_item_metadata() {
    let feed = parse_feed_bytes(RSS.as_bytes(), "https://news.example.com/rss").unwrap();
    let first = &feed.items[0];

    assert_eq!(first.title, "First");
    assert_eq!(first.categories, vec!["world".to_string()]);
    // 2024-01-15T10:00:00Z
    assert_eq!(first.published_ms, 1_705_312_800_000);
    assert_eq!(first.updated_ms, first.published_ms);
    assert_eq!(feed.items[1].published_ms, 0);
}

#[test]
fn test_atom_alternate_link_preferred() {
    let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
    <title>Atom Blog</title>
    <id>urn:uuid:blog</id>
    <updated>2024-02-01T00:00:00Z</updated>
    <entry>
        <title>Post</title>
        <id>urn:uuid:post-1</id>
        <updated>2024-02-01T00:00:00Z</updated>
        <link rel="enclosure" href="https://cdn.example.com/a.mp3" type="audio/mpeg"/>
        <link rel="alternate" href="https://blog.example.com/post-1"/>
    </entry>
</feed>"#;

    let feed = parse_feed_bytes(atom.as_bytes(), "https://blog.example.com/atom").unwrap();
    assert_eq!(feed.guids(), vec!["urn:uuid:post-1"]);
    assert_eq!(feed.links(), vec!["https://blog.example.com/post-1"]);
}

#[test]
fn test_empty_channel_is_not_an_error() {
    let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Quiet</title></channel></rss>"#;

    let feed = parse_feed_bytes(rss.as_bytes(), "https://quiet.example.com/rss").unwrap();
    assert!(feed.items.is_empty());
    assert!(feed.guids().is_empty());
}

#[test]
fn test_reader_input_matches_bytes_input() {
    let from_bytes = parse_feed_bytes(RSS.as_bytes(), "u").unwrap();
    let from_reader = parse_feed_reader(std::io::Cursor::new(RSS.as_bytes()), "u").unwrap();
    assert_eq!(from_bytes.items, from_reader.items);
}

#[test]
fn test_html_is_rejected() {
    let err = parse_feed_bytes(b"<html><body>not a feed</body></html>", "u").unwrap_err();
    assert!(matches!(err, FeedError::Parse(_)));
    assert!(err.to_string().starts_with("failed to parse feed"));
}

#[test]
fn test_item_without_guid_gets_stable_generated_id() {
    let rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>T</title>
    <item><title>No id</title><link>https://news.example.com/a/9</link></item>
</channel></rss>"#;
    let first = parse_feed_bytes(rss.as_bytes(), "u").unwrap();
    let second = parse_feed_bytes(rss.as_bytes(), "u").unwrap();

    let guids = first.guids();
    assert_eq!(guids.len(), 1);
    assert!(!guids[0].is_empty());
    assert_eq!(guids, second.guids());
    assert_eq!(first.links(), vec!["https://news.example.com/a/9"]);
}
