// ABOUTME: Integration tests for the blocking fetch client against httpmock servers.
// ABOUTME: Covers page fetching, retry budget exhaustion, feeds and same-site link extraction.

use std::net::TcpListener;
use std::time::{Duration, Instant};

use exhtml::dom::query::elements_by_tag;
use exhtml::{Client, ErrorCode, DEFAULT_USER_AGENT};
use httpmock::prelude::*;
use pretty_assertions::assert_eq;

const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
    <channel>
        <title>Wire</title>
        <link>https://wire.example.com</link>
        <description>Wire stories</description>
        <item>
            <title>One</title>
            <link>https://wire.example.com/s/1</link>
            <guid>wire-1</guid>
        </item>
        <item>
            <title>Two</title>
            <link>https://wire.example.com/s/2</link>
            <guid>wire-2</guid>
        </item>
    </channel>
</rss>"#;

fn fast_client() -> Client {
    Client::builder()
        .attempt_timeout(Duration::from_secs(2))
        .backoff_base(Duration::from_millis(20))
        .build()
        .expect("client should build")
}

fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/", port)
}

#[test]
fn get_raw_and_doc_returns_raw_and_tree() {
    let server = MockServer::start();
    let body = "<html><head><title>Hi</title></head><body><p>one</p><p>two</p></body></html>";
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/page")
            .header("user-agent", DEFAULT_USER_AGENT);
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body(body);
    });

    let page = fast_client()
        .get_raw_and_doc(&server.url("/page"), Duration::from_secs(5))
        .expect("fetch should succeed");
    mock.assert();

    assert_eq!(page.status, 200);
    assert_eq!(&page.raw[..], body.as_bytes());
    assert_eq!(page.final_url, server.url("/page"));
    assert_eq!(elements_by_tag(page.root(), &["p"]).len(), 2);
}

#[test]
fn get_raw_and_doc_accepts_any_status() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/missing");
        then.status(404).body("<p>gone</p>");
    });

    let page = fast_client()
        .get_raw_and_doc(&server.url("/missing"), Duration::from_secs(5))
        .expect("a 404 is still a response");
    mock.assert();
    assert_eq!(page.status, 404);
    assert!(!page.is_ok());
    assert!(!page.parse_status.is_clean());
}

#[test]
fn zero_budget_makes_no_attempt() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/never");
        then.status(200).body("x");
    });

    let err = fast_client()
        .get_raw_and_doc(&server.url("/never"), Duration::ZERO)
        .unwrap_err();
    mock.assert_calls(0);
    assert_eq!(err.code, ErrorCode::Timeout);
    assert!(err.to_string().contains("before the first attempt"));
}

#[test]
fn unreachable_server_times_out_with_attempt_count() {
    let url = closed_port_url();
    let started = Instant::now();
    let err = fast_client()
        .get_raw_and_doc(&url, Duration::from_millis(50))
        .unwrap_err();

    assert!(err.is_timeout());
    assert!(err.to_string().contains("gave up after"), "{}", err);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn retries_double_the_wait_and_stop_at_the_deadline() {
    // Attempts start at about 0, 20 and 60 ms; the next would start at 140 ms,
    // past the 100 ms deadline.
    let url = closed_port_url();
    let started = Instant::now();
    let err = fast_client()
        .get_raw_and_doc(&url, Duration::from_millis(100))
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::Timeout);
    assert!(err.to_string().contains("gave up after 3 attempts"), "{}", err);
    assert!(started.elapsed() >= Duration::from_millis(100));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn invalid_url_is_rejected_before_any_request() {
    let err = fast_client()
        .get_raw_and_doc("mailto:someone@example.com", Duration::from_secs(1))
        .unwrap_err();
    assert!(err.is_invalid_url());
}

#[test]
fn feed_guids_and_links_keep_order() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/rss");
        then.status(200)
            .header("content-type", "application/rss+xml")
            .body(RSS);
    });

    let client = fast_client();
    let guids = client.feed_guids(&server.url("/rss")).unwrap();
    let links = client.feed_links(&server.url("/rss")).unwrap();
    mock.assert_calls(2);

    assert_eq!(guids, vec!["wire-1", "wire-2"]);
    assert_eq!(
        links,
        vec!["https://wire.example.com/s/1", "https://wire.example.com/s/2"]
    );
}

#[test]
fn malformed_feed_is_a_feed_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/rss");
        then.status(200).body("<html><body>not a feed</body></html>");
    });

    let err = fast_client().feed_guids(&server.url("/rss")).unwrap_err();
    assert!(err.is_feed());
}

#[test]
fn feed_transport_failure_is_a_fetch_error() {
    let err = fast_client().feed_links(&closed_port_url()).unwrap_err();
    assert!(err.is_fetch());
}

#[test]
fn extract_links_keeps_same_site_links() {
    let server = MockServer::start();
    let page = format!(
        r#"<html><body>
            <a href="{}">absolute</a>
            <a href="/b">root relative</a>
            <a href="https://other.org/c">elsewhere</a>
            <a href="d">relative</a>
        </body></html>"#,
        server.url("/a")
    );
    server.mock(|when, then| {
        when.method(GET).path("/index");
        then.status(200)
            .header("content-type", "text/html")
            .body(page);
    });

    let links = fast_client().extract_links(&server.url("/index")).unwrap();
    assert_eq!(links, vec![server.url("/a"), server.url("/b")]);
}

#[test]
fn extract_links_requires_ok_status() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/index");
        then.status(503).body("busy");
    });

    let err = fast_client().extract_links(&server.url("/index")).unwrap_err();
    assert!(err.is_status());
    assert!(err.to_string().contains("503"));
}
