// ABOUTME: Library entry point for exhtml: tree queries, tree mutation, token extraction and fetching.
// ABOUTME: Re-exports the public API: Client, ClientBuilder, Options, Page, ParseStatus, FetchError, ErrorCode.

//! exhtml - fetch HTML pages and feeds, then query and prune the parsed tree.
//!
//! Two extraction paths work on a fetched [`Page`]: the [`dom`] functions
//! run over the `scraper` tree, while the [`token`] functions scan the raw
//! bytes and return raw markup without building a tree.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use exhtml::dom::{mutate, query};
//! use exhtml::{Client, FetchError};
//!
//! fn main() -> Result<(), FetchError> {
//!     let client = Client::builder().build()?;
//!     let mut page = client.get_raw_and_doc("https://example.com/", Duration::from_secs(30))?;
//!
//!     let root = page.html.tree.root().id();
//!     mutate::remove_by_tag(&mut page.html.tree, root, &["script", "style"]);
//!
//!     for title in query::metas_by_property(page.root(), &["og:title"]) {
//!         println!("{}", title.value().attr("content").unwrap_or_default());
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod dom;
pub mod error;
pub mod options;
pub mod resource;
pub mod token;

pub use crate::client::{backoff_delay, collect_links, Client};
pub use crate::error::{ErrorCode, FetchError};
pub use crate::options::{ClientBuilder, Options, DEFAULT_USER_AGENT};
pub use crate::resource::{parse_bytes, Page, ParseStatus};
pub use crate::token::{ExtractError, Tag, Token, Tokenizer};
pub use exhtml_feed::{Feed, FeedItem};
