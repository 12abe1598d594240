// ABOUTME: Turns an HTTP response into a Page: raw body, decoded and parsed document, parse status.
// ABOUTME: Handles charset selection from Content-Type with chardetng detection as the fallback.

use bytes::Bytes;
use ego_tree::NodeRef;
use reqwest::header::CONTENT_TYPE;
use scraper::{Html, Node};

use crate::error::FetchError;

/// Whether the markup parser had to recover from malformed input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseStatus {
    Clean,
    Recovered { errors: Vec<String> },
}

impl ParseStatus {
    fn from_errors(errors: &[std::borrow::Cow<'static, str>]) -> Self {
        if errors.is_empty() {
            ParseStatus::Clean
        } else {
            ParseStatus::Recovered {
                errors: errors.iter().map(|e| e.to_string()).collect(),
            }
        }
    }

    pub fn is_clean(&self) -> bool {
        matches!(self, ParseStatus::Clean)
    }
}

/// A fetched document.
///
/// `raw` is the body exactly as received and stays usable whatever the parse
/// outcome; `html` is the tree built from the decoded body.
#[derive(Debug)]
pub struct Page {
    pub url: String,
    pub final_url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub raw: Bytes,
    pub html: Html,
    pub parse_status: ParseStatus,
}

impl Page {
    /// The document node, the root for every tree query.
    pub fn root(&self) -> NodeRef<'_, Node> {
        self.html.tree.root()
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Decodes and parses `raw` as a full HTML document.
pub fn parse_bytes(raw: &[u8], content_type: Option<&str>) -> (Html, ParseStatus) {
    let text = decode_body(raw, content_type);
    let html = Html::parse_document(&text);
    let status = ParseStatus::from_errors(&html.errors);
    (html, status)
}

/// Reads the whole body of `response` and parses it. Any status is accepted.
pub(crate) fn read_page(
    url: &str,
    op: &str,
    response: reqwest::blocking::Response,
) -> Result<Page, FetchError> {
    let status = response.status().as_u16();
    let final_url = response.url().to_string();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_lowercase());

    let raw = response.bytes().map_err(|e| {
        FetchError::read(url, op, Some(anyhow::anyhow!("failed to read body: {}", e)))
    })?;

    let (html, parse_status) = parse_bytes(&raw, content_type.as_deref());

    Ok(Page {
        url: url.to_string(),
        final_url,
        status,
        content_type,
        raw,
        html,
        parse_status,
    })
}

/// Decode body bytes to a String using the Content-Type charset or detection.
fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(encoding) = content_type
        .and_then(extract_charset)
        .and_then(|charset| encoding_rs::Encoding::for_label(charset.as_bytes()))
    {
        let (decoded, _, _) = encoding.decode(body);
        return decoded.into_owned();
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

/// Extract charset value from Content-Type header.
fn extract_charset(content_type: &str) -> Option<String> {
    content_type
        .to_lowercase()
        .split(';')
        .find_map(|part| part.trim().strip_prefix("charset=").map(str::to_string))
        .map(|charset| charset.trim_matches('"').trim_matches('\'').to_string())
}
