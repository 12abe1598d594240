// ABOUTME: The Client that fetches pages with a deadline-bounded retry loop, feeds and link lists.
// ABOUTME: Blocking reqwest transport; every failure is a FetchError and every retry a tracing event.

use std::thread;
use std::time::{Duration, Instant};

use ego_tree::NodeRef;
use exhtml_feed::{parse_feed_reader, Feed};
use reqwest::StatusCode;
use scraper::Node;
use tracing::{debug, warn};
use url::Url;

use crate::dom::query::tag_with_attr;
use crate::error::FetchError;
use crate::options::{ClientBuilder, Options};
use crate::resource::{read_page, Page};

const OP_GET_RAW_AND_DOC: &str = "get_raw_and_doc";
const OP_FEED: &str = "feed";
const OP_EXTRACT_LINKS: &str = "extract_links";

/// Sleep before retry number `attempt + 1`: `base * 2^attempt`. The exponent
/// stops growing at 31 and the product saturates at `Duration::MAX`.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(1u32 << attempt.min(31))
}

/// HTTP client for pages and feeds.
pub struct Client {
    opts: Options,
    http_client: reqwest::blocking::Client,
}

impl Client {
    /// Create a new ClientBuilder for configuring the client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a new Client with the given options.
    pub fn new(opts: Options) -> Result<Self, FetchError> {
        let http_client = match opts.http_client.clone() {
            Some(client) => client,
            None => reqwest::blocking::Client::builder()
                .user_agent(&opts.user_agent)
                .timeout(opts.attempt_timeout)
                .gzip(true)
                .brotli(true)
                .deflate(true)
                .build()
                .map_err(|e| {
                    FetchError::client(
                        "build",
                        Some(anyhow::anyhow!("failed to build HTTP client: {}", e)),
                    )
                })?,
        };

        Ok(Self { opts, http_client })
    }

    pub fn options(&self) -> &Options {
        &self.opts
    }

    fn request(&self, url: &Url) -> reqwest::Result<reqwest::blocking::Response> {
        let mut request = self.http_client.get(url.clone());
        for (key, value) in &self.opts.headers {
            request = request.header(key, value);
        }
        request.send()
    }

    /// Fetches `url`, retrying transport failures until `retry_budget` has
    /// elapsed since the call started.
    ///
    /// Any HTTP status counts as a response and is returned in the page. A
    /// failure while reading the body is not retried. When the budget runs
    /// out the error is a Timeout carrying the attempt count and the last
    /// transport error; a zero budget makes no attempt at all.
    pub fn get_raw_and_doc(&self, url: &str, retry_budget: Duration) -> Result<Page, FetchError> {
        let target = validate_url(url, OP_GET_RAW_AND_DOC)?;
        let deadline = Instant::now().checked_add(retry_budget);
        let mut attempt: u32 = 0;
        let mut last_error: Option<reqwest::Error> = None;

        while deadline.map_or(true, |deadline| Instant::now() < deadline) {
            match self.request(&target) {
                Ok(response) => {
                    let page = read_page(url, OP_GET_RAW_AND_DOC, response)?;
                    debug!(
                        url,
                        status = page.status,
                        bytes = page.raw.len(),
                        attempts = attempt + 1,
                        "fetched page"
                    );
                    return Ok(page);
                }
                Err(err) => {
                    let delay = backoff_delay(self.opts.backoff_base, attempt);
                    warn!(
                        url,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "server not responding; retrying"
                    );
                    last_error = Some(err);
                    attempt = attempt.saturating_add(1);
                    thread::sleep(delay);
                }
            }
        }

        let source = match last_error {
            Some(err) => anyhow::anyhow!("gave up after {} attempts: {}", attempt, err),
            None => anyhow::anyhow!("retry budget of {:?} elapsed before the first attempt", retry_budget),
        };
        Err(FetchError::timeout(url, OP_GET_RAW_AND_DOC, Some(source)))
    }

    /// Fetches and parses a feed with a single attempt.
    pub fn feed(&self, url: &str) -> Result<Feed, FetchError> {
        let target = validate_url(url, OP_FEED)?;
        let response = self.request(&target).map_err(|e| {
            FetchError::fetch(url, OP_FEED, Some(anyhow::anyhow!("request failed: {}", e)))
        })?;
        parse_feed_reader(response, url).map_err(|e| FetchError::feed(url, OP_FEED, Some(e.into())))
    }

    /// Every item's guid, in feed order.
    pub fn feed_guids(&self, url: &str) -> Result<Vec<String>, FetchError> {
        Ok(self.feed(url)?.guids())
    }

    /// Every item's link, in feed order.
    pub fn feed_links(&self, url: &str) -> Result<Vec<String>, FetchError> {
        Ok(self.feed(url)?.links())
    }

    /// Fetches `url` once and returns the same-site links found in it.
    ///
    /// Anything but a 200 response is a Status error. See [`collect_links`]
    /// for which links are kept.
    pub fn extract_links(&self, url: &str) -> Result<Vec<String>, FetchError> {
        let target = validate_url(url, OP_EXTRACT_LINKS)?;
        let response = self.request(&target).map_err(|e| {
            FetchError::fetch(url, OP_EXTRACT_LINKS, Some(anyhow::anyhow!("request failed: {}", e)))
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::status(
                url,
                OP_EXTRACT_LINKS,
                Some(anyhow::anyhow!("HTTP status {}", status)),
            ));
        }

        let page = read_page(url, OP_EXTRACT_LINKS, response)?;
        let base = Url::parse(&page.final_url).unwrap_or_else(|_| target.clone());
        let host = target.host_str().unwrap_or_default();
        Ok(collect_links(page.root(), &base, host))
    }
}

/// Resolves every `<a href>` under `root` against `base`, keeping absolute
/// `http` links that mention `host` and root-relative links. Hrefs that do
/// not resolve are skipped.
pub fn collect_links(root: NodeRef<'_, Node>, base: &Url, host: &str) -> Vec<String> {
    tag_with_attr(root, "a", "href")
        .into_iter()
        .flat_map(|anchor| {
            anchor
                .value()
                .attrs()
                .filter(|(key, _)| *key == "href")
                .map(|(_, href)| href)
        })
        .filter_map(|href| {
            let link = base.join(href).ok()?;
            let same_site = href.starts_with("http") && href.contains(host);
            (same_site || href.starts_with('/')).then(|| link.to_string())
        })
        .collect()
}

fn validate_url(url: &str, op: &str) -> Result<Url, FetchError> {
    if url.is_empty() {
        return Err(FetchError::invalid_url(url, op, None));
    }
    let parsed = Url::parse(url).map_err(|e| {
        FetchError::invalid_url(url, op, Some(anyhow::anyhow!("invalid URL: {}", e)))
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        _ => Err(FetchError::invalid_url(
            url,
            op,
            Some(anyhow::anyhow!("scheme must be http or https")),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scraper::Html;

    #[test]
    fn backoff_doubles_from_base() {
        let base = Duration::from_secs(1);
        let delays: Vec<u64> = (0..4).map(|a| backoff_delay(base, a).as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8]);
    }

    #[test]
    fn backoff_saturates() {
        let base = Duration::from_secs(1);
        assert_eq!(backoff_delay(base, 31), Duration::from_secs(1 << 31));
        assert_eq!(backoff_delay(base, 40), backoff_delay(base, 31));
        assert_eq!(backoff_delay(base, u32::MAX), backoff_delay(base, 31));
        assert_eq!(backoff_delay(Duration::MAX, 3), Duration::MAX);
    }

    #[test]
    fn validate_rejects_bad_urls() {
        assert!(validate_url("", "op").unwrap_err().is_invalid_url());
        assert!(validate_url("not a url", "op").unwrap_err().is_invalid_url());
        assert!(validate_url("ftp://example.com/", "op").unwrap_err().is_invalid_url());
        assert!(validate_url("https://example.com/", "op").is_ok());
    }

    #[test]
    fn collect_links_keeps_same_site_and_root_relative() {
        let doc = Html::parse_document(
            r#"<body>
                <a href="/news/1">one</a>
                <a href="https://www.example.com/news/2">two</a>
                <a href="https://other.org/x">away</a>
                <a href="relative/3">rel</a>
                <a>none</a>
            </body>"#,
        );
        let base = Url::parse("https://www.example.com/index.html").unwrap();
        let links = collect_links(doc.tree.root(), &base, "www.example.com");
        assert_eq!(
            links,
            vec![
                "https://www.example.com/news/1".to_string(),
                "https://www.example.com/news/2".to_string(),
            ]
        );
    }

    #[test]
    fn client_builds_with_defaults() {
        let client = Client::builder().build().unwrap();
        assert_eq!(client.options().attempt_timeout, Duration::from_secs(10));
    }
}
