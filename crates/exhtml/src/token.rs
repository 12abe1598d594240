// ABOUTME: Forward-only token stream over raw HTML and the byte-range extractors built on it.
// ABOUTME: Splits text and raw-text bodies itself and hands each tag to a lenient quick-xml reader.

//! Token-stream extraction.
//!
//! These functions work on raw bytes instead of a parsed tree and return raw
//! markup. They are deliberately loose: [`elements_by_tag_raw`] gates text on
//! "inside any open tag", not "inside a matched tag", and the first-match
//! helpers return the tokenizer's remaining input rather than a scoped
//! subtree. Callers that need structure should parse and use [`crate::dom`].

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::reader::Reader;

use crate::dom::TagSet;

/// Elements whose content is text up to the matching end tag.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "iframe", "noembed", "noframes", "noscript", "plaintext", "script", "style", "textarea",
    "title", "xmp",
];

/// A tokenizer failure, reported with the byte offset it was detected at.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("tokenizer error at byte {offset}: {message}")]
pub struct ExtractError {
    pub message: String,
    pub offset: usize,
}

/// A start, end or self-closing tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag<'a> {
    /// Lower-cased tag name.
    pub name: String,
    /// Attributes in source order with lower-cased keys, values unescaped
    /// where possible.
    pub attrs: Vec<(String, String)>,
    /// The tag's markup exactly as it appears in the input.
    pub raw: &'a [u8],
}

impl<'a> Tag<'a> {
    fn from_start(start: &BytesStart<'_>, raw: &'a [u8]) -> Self {
        // A malformed attribute is skipped; the ones around it still count.
        let attrs = start
            .html_attributes()
            .filter_map(Result::ok)
            .map(|attr| {
                let key = lower_name(attr.key.as_ref());
                let value = String::from_utf8_lossy(&attr.value).into_owned();
                let value = match quick_xml::escape::unescape(&value) {
                    Ok(unescaped) => unescaped.into_owned(),
                    Err(_) => value,
                };
                (key, value)
            })
            .collect();
        Self {
            name: lower_name(start.name().as_ref()),
            attrs,
            raw,
        }
    }

    fn from_end(end: &BytesEnd<'_>, raw: &'a [u8]) -> Self {
        Self {
            name: lower_name(end.name().as_ref()),
            attrs: Vec::new(),
            raw,
        }
    }

    /// Value of the first attribute named `key`.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// True when any attribute is exactly `key="value"`.
    pub fn has_attr_value(&self, key: &str, value: &str) -> bool {
        self.attrs.iter().any(|(k, v)| k == key && v == value)
    }
}

fn lower_name(name: &[u8]) -> String {
    String::from_utf8_lossy(name).to_ascii_lowercase()
}

/// One unit of the token stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    StartTag(Tag<'a>),
    EndTag(Tag<'a>),
    SelfClosingTag(Tag<'a>),
    /// Character data, including entity references, as raw bytes.
    Text(&'a [u8]),
    /// Comments, doctypes, CDATA, declarations and processing instructions.
    Other(&'a [u8]),
    /// The stream stops after an error.
    Error(ExtractError),
}

/// True when `bytes` opens a tag, end tag, comment, declaration or
/// processing instruction. Any other `<` is text.
fn starts_markup(bytes: &[u8]) -> bool {
    match bytes {
        [b'<', next, ..] if next.is_ascii_alphabetic() => true,
        [b'<', b'!' | b'?', ..] => true,
        [b'<', b'/', next, ..] => next.is_ascii_alphabetic(),
        _ => false,
    }
}

/// Length of the text run at the start of `rest`, which does not open markup.
fn text_len(rest: &[u8]) -> usize {
    (1..rest.len())
        .find(|&i| rest[i] == b'<' && starts_markup(&rest[i..]))
        .unwrap_or(rest.len())
}

/// Length of a raw-text body: everything before `</name` followed by `>`,
/// `/` or whitespace, matched case-insensitively.
fn raw_text_len(rest: &[u8], name: &str) -> usize {
    let name = name.as_bytes();
    (0..rest.len())
        .find(|&i| {
            let tail = &rest[i..];
            tail.starts_with(b"</")
                && tail.len() > name.len() + 2
                && tail[2..2 + name.len()].eq_ignore_ascii_case(name)
                && matches!(
                    tail[2 + name.len()],
                    b'>' | b'/' | b' ' | b'\t' | b'\n' | b'\r' | b'\x0c'
                )
        })
        .unwrap_or(rest.len())
}

fn markup_reader(markup: &[u8]) -> Reader<&[u8]> {
    let mut reader = Reader::from_reader(markup);
    let config = reader.config_mut();
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    config.check_comments = false;
    config.expand_empty_elements = false;
    reader
}

/// Lazily tokenizes a byte buffer. Ends at end of input or right after an
/// [`Token::Error`].
///
/// Text runs and the bodies of raw-text elements such as `<script>` are
/// split off here; each piece of markup is read by a lenient quick-xml
/// reader positioned at its `<`.
pub struct Tokenizer<'a> {
    input: &'a [u8],
    offset: usize,
    raw_text: Option<&'static str>,
    done: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            offset: 0,
            raw_text: None,
            done: false,
        }
    }

    /// Input not yet consumed, starting right after the last token returned.
    pub fn buffered(&self) -> &'a [u8] {
        &self.input[self.offset..]
    }

    fn advance(&mut self, len: usize) -> &'a [u8] {
        let input = self.input;
        let start = self.offset;
        self.offset = (start + len).min(input.len());
        &input[start..self.offset]
    }

    fn read_markup(&mut self) -> Option<Token<'a>> {
        let rest = self.buffered();
        let mut reader = markup_reader(rest);
        let event = reader.read_event();
        let len = usize::try_from(reader.buffer_position())
            .map_or(rest.len(), |pos| pos.min(rest.len()));
        let raw = self.advance(len);

        let token = match event {
            Ok(Event::Start(ref e)) => {
                let tag = Tag::from_start(e, raw);
                self.raw_text = RAW_TEXT_ELEMENTS
                    .iter()
                    .copied()
                    .find(|name| *name == tag.name);
                Token::StartTag(tag)
            }
            Ok(Event::Empty(ref e)) => Token::SelfClosingTag(Tag::from_start(e, raw)),
            Ok(Event::End(ref e)) => Token::EndTag(Tag::from_end(e, raw)),
            Ok(Event::Eof) => {
                self.done = true;
                return None;
            }
            Ok(_) if len == 0 => {
                self.done = true;
                return None;
            }
            Ok(_) => Token::Other(raw),
            Err(err) => {
                self.done = true;
                Token::Error(ExtractError {
                    message: err.to_string(),
                    offset: self.offset,
                })
            }
        };
        Some(token)
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let rest = self.buffered();
        if self.done || rest.is_empty() {
            self.done = true;
            return None;
        }

        if let Some(name) = self.raw_text.take() {
            let len = raw_text_len(rest, name);
            if len > 0 {
                return Some(Token::Text(self.advance(len)));
            }
        }
        if starts_markup(rest) {
            self.read_markup()
        } else {
            Some(Token::Text(self.advance(text_len(rest))))
        }
    }
}

/// Collects the raw markup of every start/end tag named in `tags`, plus every
/// text run that occurs while at least one tag of any name is open.
///
/// Depth is counted over all start and end tags, so text between unrelated
/// tags is included too. Self-closing tags are copied when named but do not
/// move the depth.
pub fn elements_by_tag_raw(raw: &[u8], tags: &[&str]) -> Result<Vec<u8>, ExtractError> {
    let mut out = Vec::new();
    let tags = TagSet::Many(tags);
    if raw.is_empty() || tags.is_empty() {
        return Ok(out);
    }

    let mut depth: i64 = 0;
    for token in Tokenizer::new(raw) {
        match token {
            Token::StartTag(tag) => {
                if tags.contains(&tag.name) {
                    out.extend_from_slice(tag.raw);
                }
                depth += 1;
            }
            Token::EndTag(tag) => {
                if tags.contains(&tag.name) {
                    out.extend_from_slice(tag.raw);
                }
                depth -= 1;
            }
            Token::SelfClosingTag(tag) => {
                if tags.contains(&tag.name) {
                    out.extend_from_slice(tag.raw);
                }
            }
            Token::Text(text) if depth > 0 => out.extend_from_slice(text),
            Token::Text(_) | Token::Other(_) => {}
            Token::Error(err) => return Err(err),
        }
    }
    Ok(out)
}

/// Finds the first start tag `tag` carrying exactly `key="value"` and returns
/// everything after it.
///
/// The returned window begins right after the matched tag and runs to the end
/// of the input; it is not trimmed to the element's own subtree.
pub fn first_with_attr_raw<'a>(raw: &'a [u8], tag: &str, key: &str, value: &str) -> Option<&'a [u8]> {
    if raw.is_empty() || tag.is_empty() || key.is_empty() || value.is_empty() {
        return None;
    }
    let mut tokenizer = Tokenizer::new(raw);
    while let Some(token) = tokenizer.next() {
        match token {
            Token::StartTag(start) if start.name == tag && start.has_attr_value(key, value) => {
                return Some(tokenizer.buffered());
            }
            Token::Error(_) => return None,
            _ => {}
        }
    }
    None
}

pub fn div_with_attr_raw<'a>(raw: &'a [u8], key: &str, value: &str) -> Option<&'a [u8]> {
    first_with_attr_raw(raw, "div", key, value)
}

pub fn element_by_tag_and_id_raw<'a>(raw: &'a [u8], tag: &str, id: &str) -> Option<&'a [u8]> {
    first_with_attr_raw(raw, tag, "id", id)
}

/// Concatenates the remaining-input window of every `tag` start tag whose
/// class is exactly `class`. Nested matches produce overlapping copies.
pub fn elements_by_tag_and_class_raw(
    raw: &[u8],
    tag: &str,
    class: &str,
) -> Result<Vec<u8>, ExtractError> {
    let mut out = Vec::new();
    if raw.is_empty() || tag.is_empty() || class.is_empty() {
        return Ok(out);
    }
    let mut tokenizer = Tokenizer::new(raw);
    while let Some(token) = tokenizer.next() {
        match token {
            Token::StartTag(start) if start.name == tag && start.has_attr_value("class", class) => {
                out.extend_from_slice(tokenizer.buffered());
            }
            Token::Error(err) => return Err(err),
            _ => {}
        }
    }
    Ok(out)
}
